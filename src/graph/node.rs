//! A lattice candidate: one (surface, yomi) pair anchored at a start
//! position, plus the mutable state the forward fill and N-best extraction
//! accumulate on it.
//!
//! Node identity in this crate is a `Vec<Node>` index rather than a pointer
//! or `Rc`: the graph is built once per `convert` call and discarded at
//! return (see the top-level concurrency note), so an index-addressed
//! arena with `Cell`/`RefCell` for the per-node mutable fields gives the
//! same "mutate in place during fill" shape the model calls for without
//! reaching for shared ownership machinery a single-threaded, single-owner
//! structure doesn't need.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::lm::{default_cost, default_cost_for_short, SystemBigramLM, SystemUnigramLM, UNKNOWN_WORD_ID};
use crate::user_lm::UserLanguageModel;

pub const BOS_SURFACE: &str = "__BOS__";
pub const EOS_SURFACE: &str = "__EOS__";
pub const BOS_TOKEN_KEY: &str = "__BOS__/__BOS__";
pub const EOS_TOKEN_KEY: &str = "__EOS__/__EOS__";

/// Index into the owning [`crate::graph::lattice::Graph`]'s node arena.
/// `usize::MAX` is never a valid index; it is used as a "no predecessor
/// yet" sentinel so `prev` can live in a plain `Cell` instead of a `Cell<Option<usize>>`.
pub type NodeIndex = usize;
const NO_PREV: NodeIndex = usize::MAX;

pub struct Node {
    /// Character index into the yomi string; BOS uses −1.
    pub start_pos: i32,
    pub surface: String,
    pub yomi: String,
    key: String,
    /// `(word_id, system unigram score)`, filled once at construction time
    /// by consulting the system unigram LM so later cost lookups are pure
    /// cache reads.
    word_id_and_score: Option<(i32, f32)>,

    prev: Cell<NodeIndex>,
    total_cost: Cell<f32>,
    bigram_cache: RefCell<HashMap<String, f32>>,
}

impl Node {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn end_pos(&self) -> i32 {
        self.start_pos + self.yomi.chars().count() as i32
    }

    pub fn is_bos(&self) -> bool {
        self.key == BOS_TOKEN_KEY
    }

    pub fn is_eos(&self) -> bool {
        self.key == EOS_TOKEN_KEY
    }

    pub fn word_id(&self) -> i32 {
        self.word_id_and_score.map(|(id, _)| id).unwrap_or(UNKNOWN_WORD_ID)
    }

    /// Materializes the user-facing surface: the stored literal, unless it
    /// begins with `(`, in which case it is a tiny-Lisp expression evaluated
    /// fresh on every call (e.g. an entry that surfaces the current date).
    /// Lattice costs and the word key always use the literal, unevaluated
    /// `surface` field — only presentation goes through the evaluator.
    pub fn resolved_surface(&self) -> anyhow::Result<String> {
        if self.surface.starts_with('(') {
            crate::lisp::run(&self.surface)
        } else {
            Ok(self.surface.clone())
        }
    }

    pub fn prev(&self) -> Option<NodeIndex> {
        let p = self.prev.get();
        if p == NO_PREV {
            None
        } else {
            Some(p)
        }
    }

    pub fn set_prev(&self, prev: NodeIndex) {
        self.prev.set(prev);
    }

    pub fn total_cost(&self) -> f32 {
        self.total_cost.get()
    }

    pub fn set_total_cost(&self, cost: f32) {
        self.total_cost.set(cost);
    }

    fn make_key(surface: &str, yomi: &str) -> String {
        format!("{surface}/{yomi}")
    }

    pub(crate) fn create_bos() -> Node {
        Node {
            start_pos: -1,
            surface: BOS_SURFACE.to_string(),
            yomi: BOS_SURFACE.to_string(),
            key: BOS_TOKEN_KEY.to_string(),
            word_id_and_score: None,
            prev: Cell::new(NO_PREV),
            total_cost: Cell::new(0.0),
            bigram_cache: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn create_eos(input_length: i32) -> Node {
        Node {
            start_pos: input_length,
            surface: EOS_SURFACE.to_string(),
            yomi: EOS_SURFACE.to_string(),
            key: EOS_TOKEN_KEY.to_string(),
            word_id_and_score: None,
            prev: Cell::new(NO_PREV),
            total_cost: Cell::new(0.0),
            bigram_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Consults `sys_uni_lm` once, caching `(word_id, score)` on the node.
    pub fn new(
        start_pos: i32,
        surface: &str,
        yomi: &str,
        sys_uni_lm: &dyn SystemUnigramLM,
    ) -> Node {
        assert!(!surface.is_empty(), "surface must not be empty: {yomi}");
        let key = Self::make_key(surface, yomi);
        let (word_id, score) = sys_uni_lm.find_unigram(&key);
        let word_id_and_score = if word_id == UNKNOWN_WORD_ID {
            None
        } else {
            Some((word_id, score))
        };
        Node {
            start_pos,
            surface: surface.to_string(),
            yomi: yomi.to_string(),
            key,
            word_id_and_score,
            prev: Cell::new(NO_PREV),
            total_cost: Cell::new(0.0),
            bigram_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Step 1 of forward fill: this node's own (non-transition) cost.
    pub fn calc_node_cost(&self, user_lm: &UserLanguageModel) -> f32 {
        if let Some(cost) = user_lm.get_unigram_cost(&self.key) {
            return cost;
        }
        if let Some((_, score)) = self.word_id_and_score {
            self.total_cost.set(score);
            return score;
        }
        if self.surface.chars().count() < self.yomi.chars().count() {
            default_cost_for_short()
        } else {
            default_cost()
        }
    }

    /// Transition cost from `self` to `next`, memoized under `next`'s key.
    pub fn get_bigram_cost(
        &self,
        next: &Node,
        user_lm: &UserLanguageModel,
        sys_bi_lm: &dyn SystemBigramLM,
    ) -> f32 {
        let cost = if let Some(cost) = user_lm.get_bigram_cost(&self.key, &next.key) {
            cost
        } else if self.word_id() == UNKNOWN_WORD_ID || next.word_id() == UNKNOWN_WORD_ID {
            default_cost()
        } else {
            let score = sys_bi_lm.find_bigram(self.word_id(), next.word_id());
            if score != 0.0 {
                score
            } else {
                default_cost()
            }
        };
        self.bigram_cache.borrow_mut().insert(next.key.clone(), cost);
        cost
    }

    /// Memoized lookup used by N-best re-sorting; the cache is guaranteed
    /// populated for every predecessor visited during forward fill.
    pub fn get_bigram_cost_from_cache(&self, next: &Node) -> f32 {
        self.bigram_cache
            .borrow()
            .get(&next.key)
            .copied()
            .unwrap_or_else(default_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::{MarisaSystemBigramLMBuilder, MarisaSystemUnigramLMBuilder};

    #[test]
    fn bos_and_eos_have_distinguished_keys() {
        let bos = Node::create_bos();
        let eos = Node::create_eos(5);
        assert!(bos.is_bos());
        assert!(eos.is_eos());
        assert_eq!(bos.key(), BOS_TOKEN_KEY);
        assert_eq!(eos.key(), EOS_TOKEN_KEY);
    }

    #[test]
    fn construction_caches_unigram_lookup() -> anyhow::Result<()> {
        let mut builder = MarisaSystemUnigramLMBuilder::new();
        builder.add("猫/ねこ", -2.0)?;
        let lm = builder.build()?;

        let node = Node::new(0, "猫", "ねこ", &lm);
        assert_ne!(node.word_id(), UNKNOWN_WORD_ID);
        Ok(())
    }

    #[test]
    fn resolved_surface_passes_through_literal_surfaces() -> anyhow::Result<()> {
        let lm = MarisaSystemUnigramLMBuilder::new().build()?;
        let node = Node::new(0, "猫", "ねこ", &lm);
        assert_eq!(node.resolved_surface()?, "猫");
        Ok(())
    }

    #[test]
    fn resolved_surface_evaluates_lisp_expressions() -> anyhow::Result<()> {
        let lm = MarisaSystemUnigramLMBuilder::new().build()?;
        let node = Node::new(0, r#"(strftime (current-datetime) "%Y")"#, "きょう", &lm);
        let resolved = node.resolved_surface()?;
        assert_eq!(resolved.len(), 4);
        assert!(resolved.chars().all(|c| c.is_ascii_digit()));
        Ok(())
    }

    #[test]
    fn bigram_cost_is_memoized() -> anyhow::Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let user_lm = UserLanguageModel::load(
            tmp_dir.path().join("u.txt").to_str().unwrap(),
            tmp_dir.path().join("b.txt").to_str().unwrap(),
        )?;

        let mut uni_builder = MarisaSystemUnigramLMBuilder::new();
        uni_builder.add("猫/ねこ", -2.0)?;
        uni_builder.add("が/が", -1.0)?;
        let uni_lm = uni_builder.build()?;

        let a = Node::new(0, "猫", "ねこ", &uni_lm);
        let b = Node::new(2, "が", "が", &uni_lm);

        let bi_builder = MarisaSystemBigramLMBuilder::new();
        let bi_lm = bi_builder.build()?;

        let first = a.get_bigram_cost(&b, &user_lm, &bi_lm);
        let cached = a.get_bigram_cost_from_cache(&b);
        assert_eq!(first, cached);
        Ok(())
    }
}
