pub mod hash_map_dict;
pub mod marisa_dict;

pub use hash_map_dict::HashMapKanaKanjiDict;
pub use marisa_dict::{MarisaKanaKanjiDict, MarisaKanaKanjiDictBuilder};

/// Yomi (hiragana reading) to candidate kanji/kana surfaces.
pub trait KanaKanjiDict {
    /// All surfaces registered for `yomi`, in trie-enumeration order. Empty
    /// if the reading is unknown — never an error, since "no candidates" is
    /// a routine outcome of a failed lookup, not a malformed artifact.
    fn find_kanjis(&self, yomi: &str) -> Vec<String>;
}
