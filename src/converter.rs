//! Top-level entry point: rōmaji (or a pass-through literal) in, ranked
//! kana-kanji segments out.

use anyhow::Result;
use regex::Regex;

use crate::config::EngineConfig;
use crate::dict::{KanaKanjiDict, MarisaKanaKanjiDict};
use crate::graph::{Candidate, ForcedSlice, GraphResolver};
use crate::lm::{MarisaSystemBigramLM, MarisaSystemUnigramLM};
use crate::romkan::RomkanConverter;
use crate::user_lm::UserLanguageModel;

/// One convertible unit of output: the Viterbi-chosen candidate first,
/// followed by user-facing alternatives in joint-score order.
#[derive(Debug, Clone)]
pub struct Segment {
    pub candidates: Vec<Candidate>,
}

impl Segment {
    pub fn best(&self) -> &Candidate {
        &self.candidates[0]
    }
}

fn trailing_consonant_tail_pattern() -> Regex {
    // N is excluded: "nn"/"n'" normalizes to a full kana in Romkan, so a
    // trailing lone "n" is not a dangling consonant the way the others are.
    Regex::new(r"[qwrtypsdfghjklzxcvbm]+$").expect("trailing consonant pattern must compile")
}

fn starts_with_ascii_uppercase(s: &str) -> bool {
    s.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
}

pub struct Converter {
    romkan: RomkanConverter,
    normal_dict: MarisaKanaKanjiDict,
    single_term_dict: Option<MarisaKanaKanjiDict>,
    sys_uni_lm: MarisaSystemUnigramLM,
    sys_bi_lm: MarisaSystemBigramLM,
    user_lm: UserLanguageModel,
}

impl Converter {
    pub fn new(
        romkan: RomkanConverter,
        normal_dict: MarisaKanaKanjiDict,
        single_term_dict: Option<MarisaKanaKanjiDict>,
        sys_uni_lm: MarisaSystemUnigramLM,
        sys_bi_lm: MarisaSystemBigramLM,
        user_lm: UserLanguageModel,
    ) -> Converter {
        Converter {
            romkan,
            normal_dict,
            single_term_dict,
            sys_uni_lm,
            sys_bi_lm,
            user_lm,
        }
    }

    /// Loads every artifact named by `config` plus a caller-supplied
    /// (already-merged) rōmaji table.
    pub fn load(
        config: &EngineConfig,
        romkan_table: &std::collections::HashMap<String, String>,
    ) -> Result<Converter> {
        let romkan = RomkanConverter::build(romkan_table);
        let normal_dict = MarisaKanaKanjiDict::load(
            config.dict_path.to_str().expect("dict_path must be utf-8"),
        )?;
        let single_term_dict = match &config.single_term_dict_path {
            Some(path) => Some(MarisaKanaKanjiDict::load(
                path.to_str().expect("single_term_dict_path must be utf-8"),
            )?),
            None => None,
        };
        let sys_uni_lm = MarisaSystemUnigramLM::load(
            config
                .system_unigram_lm_path
                .to_str()
                .expect("system_unigram_lm_path must be utf-8"),
        )?;
        let sys_bi_lm = MarisaSystemBigramLM::load(
            config
                .system_bigram_lm_path
                .to_str()
                .expect("system_bigram_lm_path must be utf-8"),
        )?;
        let user_lm = UserLanguageModel::load(
            config
                .user_unigram_lm_path
                .to_str()
                .expect("user_unigram_lm_path must be utf-8"),
            config
                .user_bigram_lm_path
                .to_str()
                .expect("user_bigram_lm_path must be utf-8"),
        )?;

        Ok(Converter::new(
            romkan,
            normal_dict,
            single_term_dict,
            sys_uni_lm,
            sys_bi_lm,
            user_lm,
        ))
    }

    /// `forced_slices` are character offsets into the romkan-converted
    /// hiragana head, not the raw input.
    pub fn convert(&self, input: &str, forced_slices: Option<&[ForcedSlice]>) -> Vec<Segment> {
        if forced_slices.is_none()
            && (starts_with_ascii_uppercase(input)
                || input.starts_with("http://")
                || input.starts_with("https://"))
        {
            return vec![Segment {
                candidates: vec![Candidate {
                    surface: input.to_string(),
                    yomi: input.to_string(),
                }],
            }];
        }

        let hiragana = self.romkan.to_hiragana(input);
        let tail_pattern = trailing_consonant_tail_pattern();
        let (head, tail) = match tail_pattern.find(&hiragana) {
            Some(m) => (&hiragana[..m.start()], &hiragana[m.start()..]),
            None => (hiragana.as_str(), ""),
        };

        let single_term_dict: Option<&dyn KanaKanjiDict> =
            self.single_term_dict.as_ref().map(|d| d as &dyn KanaKanjiDict);
        let single_term_dicts: Vec<&dyn KanaKanjiDict> = single_term_dict.into_iter().collect();
        let normal_dicts: Vec<&dyn KanaKanjiDict> = vec![&self.normal_dict];

        let graph = GraphResolver::build_graph(
            head,
            forced_slices,
            &normal_dicts,
            &single_term_dicts,
            &self.user_lm,
            &self.sys_uni_lm,
        );
        GraphResolver::fill(&graph, &self.user_lm, &self.sys_bi_lm);
        let raw_segments = GraphResolver::n_best(&graph, &self.sys_bi_lm);

        let mut segments: Vec<Segment> = raw_segments
            .into_iter()
            .map(|candidates| Segment { candidates })
            .collect();

        if !tail.is_empty() {
            segments.push(Segment {
                candidates: vec![Candidate {
                    surface: tail.to_string(),
                    yomi: tail.to_string(),
                }],
            });
        }

        segments
    }

    /// Records the chosen first candidate of each segment into the user
    /// LM and persists it. Hosts call this once a conversion is committed.
    pub fn learn(&mut self, segments: &[Segment]) -> Result<()> {
        let keys: Vec<String> = segments.iter().map(|s| s.best().key()).collect();
        self.user_lm.add_entry(&keys);
        self.user_lm.save()
    }
}
