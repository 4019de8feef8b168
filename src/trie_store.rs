//! Foundation trie store shared by the system LMs and the binary dictionary.
//!
//! All persistent artifacts in this crate are built on top of a single
//! `marisa-trie`-backed keyset: a word key (or a word-key/score pair, or a
//! yomi/surfaces pair) is packed into a byte string, inserted into a
//! [`rsmarisa::Keyset`], and looked up later with `predictive_search`. This
//! module owns that packing-agnostic plumbing; callers decide how to split
//! the returned bytes back into fields.

use anyhow::Result;
use rsmarisa::{Agent, Keyset, Trie};

/// Byte separator placed between a word key and its payload (score, surface
/// list, ...). `0xFF` cannot appear in valid UTF-8, so it never collides
/// with the key's own bytes.
pub const SEPARATOR: u8 = 0xFF;

/// Accumulates byte keys for a single `build()`/`save()` call.
#[derive(Default)]
pub struct TrieBuilder {
    keyset: Option<Keyset>,
}

impl TrieBuilder {
    pub fn new() -> Self {
        TrieBuilder {
            keyset: Some(Keyset::new()),
        }
    }

    pub fn push(&mut self, key: &[u8]) -> Result<()> {
        self.keyset
            .as_mut()
            .expect("keyset consumed")
            .push_back_bytes(key, 1.0)?;
        Ok(())
    }

    pub fn build(mut self) -> Result<TrieStore> {
        let mut keyset = self.keyset.take().expect("keyset consumed");
        let mut trie = Trie::new();
        trie.build(&mut keyset, 0);
        Ok(TrieStore { trie })
    }

    pub fn save(mut self, path: &str) -> Result<TrieStore> {
        let mut keyset = self.keyset.take().expect("keyset consumed");
        let mut trie = Trie::new();
        trie.build(&mut keyset, 0);
        trie.save(path)?;
        Ok(TrieStore { trie })
    }
}

/// A loaded, read-only trie. Safe to share across threads once built: no
/// method here takes `&mut self`.
pub struct TrieStore {
    trie: Trie,
}

impl TrieStore {
    pub fn load(path: &str) -> Result<TrieStore> {
        let mut trie = Trie::new();
        trie.load(path)?;
        Ok(TrieStore { trie })
    }

    pub fn num_keys(&self) -> usize {
        self.trie.num_keys()
    }

    /// Enumerates every stored key that begins with `prefix`, each carrying
    /// the trie's insertion id (stable for the lifetime of this load).
    pub fn predictive_search(&self, prefix: &[u8]) -> Vec<(Vec<u8>, u32)> {
        let mut out = Vec::new();
        let mut agent = Agent::new();
        agent.set_query_bytes(prefix);
        while self.trie.predictive_search(&mut agent) {
            out.push((agent.key().as_bytes().to_vec(), agent.key().id()));
        }
        out
    }

    /// Convenience over [`predictive_search`] for the very common case of
    /// "does exactly one entry exist for this prefix" — returns the first
    /// hit only, matching the persistent formats' use of the 0xFF/`\t`
    /// separator as a unique-prefix marker.
    pub fn find_first(&self, prefix: &[u8]) -> Option<(Vec<u8>, u32)> {
        let mut agent = Agent::new();
        agent.set_query_bytes(prefix);
        if self.trie.predictive_search(&mut agent) {
            Some((agent.key().as_bytes().to_vec(), agent.key().id()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_lookup() -> Result<()> {
        let mut builder = TrieBuilder::new();
        builder.push(b"hello\xffworld")?;
        builder.push(b"hi\xffthere")?;
        let store = builder.build()?;

        let hits = store.predictive_search(b"hello\xff");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, b"hello\xffworld");

        assert!(store.find_first(b"missing\xff").is_none());
        Ok(())
    }

    #[test]
    fn save_and_load_round_trips() -> Result<()> {
        let tmp = tempfile::NamedTempFile::new()?;
        let path = tmp.path().to_str().unwrap().to_string();

        let mut builder = TrieBuilder::new();
        builder.push(b"a\xff1")?;
        builder.push(b"b\xff2")?;
        builder.save(&path)?;

        let loaded = TrieStore::load(&path)?;
        assert_eq!(loaded.num_keys(), 2);
        Ok(())
    }
}
