//! Trie-backed `yomi -> surfaces` dictionary, keyed `yomi || 0xFF || surfaces`
//! with surfaces joined by `/`.

use anyhow::Result;

use crate::dict::KanaKanjiDict;
use crate::trie_store::{TrieBuilder, TrieStore};

#[derive(Default)]
pub struct MarisaKanaKanjiDictBuilder {
    builder: TrieBuilder,
}

impl MarisaKanaKanjiDictBuilder {
    pub fn new() -> Self {
        MarisaKanaKanjiDictBuilder {
            builder: TrieBuilder::new(),
        }
    }

    /// `surfaces` must already be deduplicated/ordered by the caller; this
    /// builder just joins and stores them.
    pub fn add(&mut self, yomi: &str, surfaces: &[String]) -> Result<()> {
        let entry = [yomi.as_bytes(), &[0xff], surfaces.join("/").as_bytes()].concat();
        self.builder.push(&entry)
    }

    pub fn save(self, path: &str) -> Result<MarisaKanaKanjiDict> {
        let store = self.builder.save(path)?;
        Ok(MarisaKanaKanjiDict { store })
    }

    pub fn build(self) -> Result<MarisaKanaKanjiDict> {
        let store = self.builder.build()?;
        Ok(MarisaKanaKanjiDict { store })
    }
}

pub struct MarisaKanaKanjiDict {
    store: TrieStore,
}

impl MarisaKanaKanjiDict {
    pub fn load(path: &str) -> Result<MarisaKanaKanjiDict> {
        let store = TrieStore::load(path)?;
        Ok(MarisaKanaKanjiDict { store })
    }
}

impl KanaKanjiDict for MarisaKanaKanjiDict {
    fn find_kanjis(&self, yomi: &str) -> Vec<String> {
        if yomi.is_empty() {
            return Vec::new();
        }
        let mut prefix = yomi.as_bytes().to_vec();
        prefix.push(0xff);
        let Some((bytes, _id)) = self.store.find_first(&prefix) else {
            return Vec::new();
        };
        let Some(sep) = bytes.iter().position(|b| *b == 0xff) else {
            return Vec::new();
        };
        let rest = String::from_utf8_lossy(&bytes[sep + 1..]);
        rest.split('/').filter(|s| !s.is_empty()).map(String::from).collect()
    }
}
