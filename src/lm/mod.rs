pub mod base;
pub mod system_bigram;
pub mod system_unigram;

pub use base::{default_cost, default_cost_for_short, SystemBigramLM, SystemUnigramLM, UNKNOWN_WORD_ID};
pub use system_bigram::{MarisaSystemBigramLM, MarisaSystemBigramLMBuilder};
pub use system_unigram::{MarisaSystemUnigramLM, MarisaSystemUnigramLMBuilder};
