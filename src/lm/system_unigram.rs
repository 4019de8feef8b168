//! Trie-backed system unigram language model: `word_key -> (word_id, score)`.

use anyhow::Result;
use log::info;

use crate::lm::base::{SystemUnigramLM, UNKNOWN_WORD_ID};
use crate::trie_store::{TrieBuilder, TrieStore};

/// Accumulates `(word_key, score)` pairs ahead of a single `save`/`build`.
#[derive(Default)]
pub struct MarisaSystemUnigramLMBuilder {
    builder: TrieBuilder,
}

impl MarisaSystemUnigramLMBuilder {
    pub fn new() -> Self {
        MarisaSystemUnigramLMBuilder {
            builder: TrieBuilder::new(),
        }
    }

    pub fn add(&mut self, word_key: &str, score: f32) -> Result<()> {
        let key = [
            word_key.as_bytes(),
            &[0xff],
            score.to_le_bytes().as_slice(),
        ]
        .concat();
        self.builder.push(&key)
    }

    pub fn save(self, path: &str) -> Result<MarisaSystemUnigramLM> {
        let store = self.builder.save(path)?;
        Ok(MarisaSystemUnigramLM { store })
    }

    pub fn build(self) -> Result<MarisaSystemUnigramLM> {
        let store = self.builder.build()?;
        Ok(MarisaSystemUnigramLM { store })
    }
}

pub struct MarisaSystemUnigramLM {
    store: TrieStore,
}

impl MarisaSystemUnigramLM {
    pub fn load(path: &str) -> Result<MarisaSystemUnigramLM> {
        info!("Loading system unigram LM from {}", path);
        let store = TrieStore::load(path)?;
        Ok(MarisaSystemUnigramLM { store })
    }
}

impl SystemUnigramLM for MarisaSystemUnigramLM {
    fn find_unigram(&self, word_key: &str) -> (i32, f32) {
        if word_key.is_empty() {
            return (UNKNOWN_WORD_ID, 0.0);
        }
        let mut prefix = word_key.as_bytes().to_vec();
        prefix.push(0xff);
        let Some((bytes, id)) = self.store.find_first(&prefix) else {
            return (UNKNOWN_WORD_ID, 0.0);
        };
        let Some(sep) = bytes.iter().position(|b| *b == 0xff) else {
            return (UNKNOWN_WORD_ID, 0.0);
        };
        let score_bytes = &bytes[sep + 1..];
        if score_bytes.len() != 4 {
            return (UNKNOWN_WORD_ID, 0.0);
        }
        let score = f32::from_le_bytes(score_bytes.try_into().unwrap());
        (id as i32, score)
    }

    fn num_keys(&self) -> usize {
        self.store.num_keys()
    }
}
