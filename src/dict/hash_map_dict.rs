//! In-memory dictionary used by tests (and by callers assembling a
//! dictionary programmatically before persisting it as a trie).

use std::collections::HashMap;

use crate::dict::KanaKanjiDict;

#[derive(Default, Clone)]
pub struct HashMapKanaKanjiDict {
    entries: HashMap<String, Vec<String>>,
}

impl HashMapKanaKanjiDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, yomi: &str, surfaces: Vec<String>) {
        self.entries.insert(yomi.to_string(), surfaces);
    }
}

impl KanaKanjiDict for HashMapKanaKanjiDict {
    fn find_kanjis(&self, yomi: &str) -> Vec<String> {
        self.entries.get(yomi).cloned().unwrap_or_default()
    }
}
