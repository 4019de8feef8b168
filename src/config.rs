//! File paths a host needs to assemble a [`crate::Converter`] from disk.
//! Resolving these paths (XDG lookup, profile directories, ...) and the
//! process lifecycle around them remain host policy; this type only
//! describes the minimal, serializable shape of "where are my artifacts".

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub system_unigram_lm_path: PathBuf,
    pub system_bigram_lm_path: PathBuf,
    pub dict_path: PathBuf,
    #[serde(default)]
    pub single_term_dict_path: Option<PathBuf>,
    pub user_unigram_lm_path: PathBuf,
    pub user_bigram_lm_path: PathBuf,
}

impl EngineConfig {
    pub fn from_yaml(src: &str) -> anyhow::Result<EngineConfig> {
        Ok(serde_yaml::from_str(src)?)
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
