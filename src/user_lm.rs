//! Per-user language model: online unigram/bigram counts learned from
//! committed conversions, persisted as two plain-text files and blended
//! into the cost model ahead of the (static) system LM.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;

/// Additive (Laplace) smoothing constant.
const ALPHA: f64 = 1e-5;

#[derive(Default)]
struct Counter {
    counts: HashMap<String, u32>,
    /// Distinct keys ever counted (`C`).
    distinct_keys: u32,
    /// Sum of all counts (`V`).
    total_count: u32,
}

impl Counter {
    fn bump(&mut self, key: &str) {
        match self.counts.get(key).copied() {
            Some(n) => {
                self.counts.insert(key.to_string(), n + 1);
            }
            None => {
                self.counts.insert(key.to_string(), 1);
                self.distinct_keys += 1;
            }
        }
        self.total_count += 1;
    }

    fn cost(&self, key: &str) -> Option<f32> {
        let count = *self.counts.get(key)?;
        let numerator = count as f64 + ALPHA;
        let denominator = self.distinct_keys as f64 + ALPHA * self.total_count as f64;
        Some((numerator / denominator).log10() as f32)
    }
}

/// Unigram and bigram counts observed across committed conversions, with a
/// `dirty` flag so `save` is a no-op when nothing changed since the last
/// successful write.
pub struct UserLanguageModel {
    unigram: Counter,
    bigram: Counter,
    yomis: HashSet<String>,
    unigram_path: String,
    bigram_path: String,
    dirty: bool,
}

impl UserLanguageModel {
    /// Loads both files if present; a missing file is treated as an empty
    /// model (first run on a fresh profile), not an error.
    pub fn load(unigram_path: &str, bigram_path: &str) -> Result<UserLanguageModel> {
        let mut model = UserLanguageModel {
            unigram: Counter::default(),
            bigram: Counter::default(),
            yomis: HashSet::new(),
            unigram_path: unigram_path.to_string(),
            bigram_path: bigram_path.to_string(),
            dirty: false,
        };

        if Path::new(unigram_path).exists() {
            let content = fs::read_to_string(unigram_path)
                .with_context(|| format!("reading {unigram_path}"))?;
            for line in content.lines() {
                let Some((key, count)) = line.rsplit_once(' ') else {
                    warn!("skipping malformed user unigram line: {line:?}");
                    continue;
                };
                let Ok(count) = count.parse::<u32>() else {
                    warn!("skipping malformed user unigram count: {line:?}");
                    continue;
                };
                model.unigram.counts.insert(key.to_string(), count);
                model.unigram.distinct_keys += 1;
                model.unigram.total_count += count;
                if let Some((_, yomi)) = key.split_once('/') {
                    model.yomis.insert(yomi.to_string());
                }
            }
        }

        if Path::new(bigram_path).exists() {
            let content = fs::read_to_string(bigram_path)
                .with_context(|| format!("reading {bigram_path}"))?;
            for line in content.lines() {
                let Some((key, count)) = line.rsplit_once(' ') else {
                    warn!("skipping malformed user bigram line: {line:?}");
                    continue;
                };
                let Ok(count) = count.parse::<u32>() else {
                    warn!("skipping malformed user bigram count: {line:?}");
                    continue;
                };
                model.bigram.counts.insert(key.to_string(), count);
                model.bigram.distinct_keys += 1;
                model.bigram.total_count += count;
            }
        }

        Ok(model)
    }

    /// Records one committed conversion: `keys` are the `"<surface>/<yomi>"`
    /// word keys of the chosen candidate for each segment, in order.
    pub fn add_entry(&mut self, keys: &[String]) {
        for key in keys {
            self.unigram.bump(key);
            if let Some((_, yomi)) = key.split_once('/') {
                self.yomis.insert(yomi.to_string());
            }
        }
        for pair in keys.windows(2) {
            let bigram_key = format!("{}\t{}", pair[0], pair[1]);
            self.bigram.bump(&bigram_key);
        }
        self.dirty = true;
    }

    pub fn get_unigram_cost(&self, key: &str) -> Option<f32> {
        self.unigram.cost(key)
    }

    pub fn get_bigram_cost(&self, k1: &str, k2: &str) -> Option<f32> {
        self.bigram.cost(&format!("{k1}\t{k2}"))
    }

    pub fn has_unigram_cost_by_yomi(&self, yomi: &str) -> bool {
        self.yomis.contains(yomi)
    }

    /// Writes both files if dirty, each via write-to-temp-then-rename so a
    /// crash mid-write never leaves a truncated file in place. Clears
    /// `dirty` only once both renames succeed.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        Self::write_atomic(&self.unigram_path, &Self::format_unigram(&self.unigram))?;
        Self::write_atomic(&self.bigram_path, &Self::format_bigram(&self.bigram))?;
        self.dirty = false;
        Ok(())
    }

    fn format_unigram(counter: &Counter) -> String {
        let mut keys: Vec<&String> = counter.counts.keys().collect();
        keys.sort();
        let mut out = String::new();
        for key in keys {
            let count = counter.counts[key];
            out.push_str(&format!("{key} {count}\n"));
        }
        out
    }

    fn format_bigram(counter: &Counter) -> String {
        Self::format_unigram(counter)
    }

    fn write_atomic(path: &str, content: &str) -> Result<()> {
        let parent = Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("creating temp file next to {path}"))?;
        tmp.write_all(content.as_bytes())
            .with_context(|| format!("writing temp file for {path}"))?;
        tmp.persist(path)
            .with_context(|| format!("renaming temp file onto {path}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learns_and_scores_unigrams() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let uni_path = tmp_dir.path().join("unigram.txt");
        let bi_path = tmp_dir.path().join("bigram.txt");

        let mut lm = UserLanguageModel::load(
            uni_path.to_str().unwrap(),
            bi_path.to_str().unwrap(),
        )
        .unwrap();

        assert_eq!(lm.get_unigram_cost("日本/にほん"), None);
        assert!(!lm.has_unigram_cost_by_yomi("にほん"));

        lm.add_entry(&["日本/にほん".to_string()]);
        assert!(lm.get_unigram_cost("日本/にほん").is_some());
        assert!(lm.has_unigram_cost_by_yomi("にほん"));
    }

    #[test]
    fn learns_bigrams_between_adjacent_keys() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let uni_path = tmp_dir.path().join("unigram.txt");
        let bi_path = tmp_dir.path().join("bigram.txt");
        let mut lm = UserLanguageModel::load(
            uni_path.to_str().unwrap(),
            bi_path.to_str().unwrap(),
        )
        .unwrap();

        lm.add_entry(&["私/わたし".to_string(), "は/は".to_string()]);
        assert!(lm.get_bigram_cost("私/わたし", "は/は").is_some());
        assert!(lm.get_bigram_cost("は/は", "私/わたし").is_none());
    }

    #[test]
    fn save_is_noop_when_clean_and_round_trips_when_dirty() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let uni_path = tmp_dir.path().join("unigram.txt");
        let bi_path = tmp_dir.path().join("bigram.txt");

        let mut lm = UserLanguageModel::load(
            uni_path.to_str().unwrap(),
            bi_path.to_str().unwrap(),
        )
        .unwrap();
        lm.save().unwrap();
        assert!(!uni_path.exists());

        lm.add_entry(&["猫/ねこ".to_string()]);
        lm.save().unwrap();
        assert!(uni_path.exists());

        let reloaded = UserLanguageModel::load(
            uni_path.to_str().unwrap(),
            bi_path.to_str().unwrap(),
        )
        .unwrap();
        assert!(reloaded.get_unigram_cost("猫/ねこ").is_some());
    }

    #[test]
    fn skips_malformed_lines_without_failing_load() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let uni_path = tmp_dir.path().join("unigram.txt");
        let bi_path = tmp_dir.path().join("bigram.txt");
        fs::write(&uni_path, "良い/よい 3\nmalformed-line-no-count\n").unwrap();

        let lm = UserLanguageModel::load(
            uni_path.to_str().unwrap(),
            bi_path.to_str().unwrap(),
        )
        .unwrap();
        assert!(lm.get_unigram_cost("良い/よい").is_some());
    }
}
