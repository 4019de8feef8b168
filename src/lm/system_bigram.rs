//! Trie-backed system bigram language model: `(word_id1, word_id2) -> score`,
//! word ids borrowed from whatever unigram model assigned them.

use anyhow::Result;
use log::info;

use crate::lm::base::SystemBigramLM;
use crate::trie_store::{TrieBuilder, TrieStore};

fn pack_ids(id1: i32, id2: i32) -> [u8; 6] {
    let a = id1.to_le_bytes();
    let b = id2.to_le_bytes();
    debug_assert_eq!(a[3], 0, "word id exceeds 24 bits: {id1}");
    debug_assert_eq!(b[3], 0, "word id exceeds 24 bits: {id2}");
    [a[0], a[1], a[2], b[0], b[1], b[2]]
}

#[derive(Default)]
pub struct MarisaSystemBigramLMBuilder {
    builder: TrieBuilder,
}

impl MarisaSystemBigramLMBuilder {
    pub fn new() -> Self {
        MarisaSystemBigramLMBuilder {
            builder: TrieBuilder::new(),
        }
    }

    pub fn add(&mut self, id1: i32, id2: i32, score: f32) -> Result<()> {
        let mut key = pack_ids(id1, id2).to_vec();
        key.extend_from_slice(&score.to_le_bytes());
        self.builder.push(&key)
    }

    pub fn save(self, path: &str) -> Result<MarisaSystemBigramLM> {
        let store = self.builder.save(path)?;
        Ok(MarisaSystemBigramLM { store })
    }

    pub fn build(self) -> Result<MarisaSystemBigramLM> {
        let store = self.builder.build()?;
        Ok(MarisaSystemBigramLM { store })
    }
}

pub struct MarisaSystemBigramLM {
    store: TrieStore,
}

impl MarisaSystemBigramLM {
    pub fn load(path: &str) -> Result<MarisaSystemBigramLM> {
        info!("Loading system bigram LM from {}", path);
        let store = TrieStore::load(path)?;
        Ok(MarisaSystemBigramLM { store })
    }

    pub fn num_keys(&self) -> usize {
        self.store.num_keys()
    }
}

impl SystemBigramLM for MarisaSystemBigramLM {
    fn find_bigram(&self, id1: i32, id2: i32) -> f32 {
        let key = pack_ids(id1, id2);
        let Some((bytes, _id)) = self.store.find_first(&key) else {
            return 0.0;
        };
        if bytes.len() < 4 {
            return 0.0;
        }
        let score_bytes = &bytes[bytes.len() - 4..];
        f32::from_le_bytes(score_bytes.try_into().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::base::default_cost;

    #[test]
    fn build_then_find() -> Result<()> {
        let mut builder = MarisaSystemBigramLMBuilder::new();
        builder.add(10, 20, -4.5)?;
        let lm = builder.build()?;

        let score = lm.find_bigram(10, 20);
        assert!((score - -4.5).abs() < 1e-6);

        assert_eq!(lm.find_bigram(99, 98), 0.0);
        Ok(())
    }

    #[test]
    fn missing_pair_falls_back_to_default_cost() -> Result<()> {
        let builder = MarisaSystemBigramLMBuilder::new();
        let lm = builder.build()?;
        let raw = lm.find_bigram(1, 2);
        assert_eq!(raw, 0.0);
        assert!(default_cost() < -15.0);
        Ok(())
    }

    #[test]
    fn save_then_load_round_trips() -> Result<()> {
        let tmp = tempfile::NamedTempFile::new()?;
        let path = tmp.path().to_str().unwrap().to_string();

        let mut builder = MarisaSystemBigramLMBuilder::new();
        builder.add(1, 2, -7.0)?;
        builder.save(&path)?;

        let lm = MarisaSystemBigramLM::load(&path)?;
        assert!((lm.find_bigram(1, 2) - -7.0).abs() < 1e-6);
        Ok(())
    }
}
