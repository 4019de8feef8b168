//! Lookup surfaces shared by the system unigram and bigram models, so the
//! graph resolver can depend on a trait rather than the marisa-backed
//! implementation directly (the teacher crate follows the same split: one
//! trait file, one storage-backed impl per model).

/// Trie insertion ids never reach this value in practice (vocabulary is
/// capped at 2^24 by the 3-byte packed id), so it doubles as "absent".
pub const UNKNOWN_WORD_ID: i32 = -1;

pub trait SystemUnigramLM {
    /// `(word_id, score)`, or `(UNKNOWN_WORD_ID, 0.0)` if `word_key` was
    /// never observed while building the model.
    fn find_unigram(&self, word_key: &str) -> (i32, f32);

    fn num_keys(&self) -> usize;
}

pub trait SystemBigramLM {
    /// Raw score, or `0.0` if the pair was never observed. `0.0` is not a
    /// valid log-probability score on its own, so callers must special-case
    /// it to `default_score` rather than trusting it at face value.
    fn find_bigram(&self, id1: i32, id2: i32) -> f32;
}

/// `log10(1e-20)`, the floor applied to any unigram/bigram lookup that comes
/// back empty.
pub fn default_cost() -> f32 {
    1e-20_f32.log10()
}

/// Slightly higher floor used when a node's surface is shorter than its
/// yomi (kanji compounds reading multiple kana per glyph): keeps short,
/// rare surfaces from sinking to the same floor as genuinely unseen words.
pub fn default_cost_for_short() -> f32 {
    1e-19_f32.log10()
}
