//! Builds a lattice from a hiragana string, runs the forward fill, and
//! extracts per-segment N-best candidate lists.

use kelp::{hira2kata, ConvOption};
use log::error;

use crate::dict::KanaKanjiDict;
use crate::graph::lattice::Graph;
use crate::graph::node::{Node, NodeIndex};
use crate::lm::{SystemBigramLM, SystemUnigramLM};
use crate::user_lm::UserLanguageModel;

/// Order-preserving "insert if absent" set: candidate surfaces must
/// dedupe without losing the deterministic enumeration order dictionary
/// lookups and katakana derivation produce — a `HashSet` would make the
/// final ranking depend on the process's randomized hasher seed.
#[derive(Default)]
struct OrderedSurfaces(Vec<String>);

impl OrderedSurfaces {
    fn insert(&mut self, surface: String) {
        if !self.0.contains(&surface) {
            self.0.push(surface);
        }
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// One non-overlapping slice of the input the caller has already committed
/// to (e.g. from an earlier conversion the user is now editing), given as
/// `[start, end)` character offsets.
#[derive(Debug, Clone, Copy)]
pub struct ForcedSlice {
    pub start: usize,
    pub end: usize,
}

/// One N-best alternative: a surface paired with the yomi it was produced
/// for, enough to reconstruct the `"<surface>/<yomi>"` word key a caller
/// needs to feed back into the user LM once a conversion is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub surface: String,
    pub yomi: String,
}

impl Candidate {
    pub fn key(&self) -> String {
        format!("{}/{}", self.surface, self.yomi)
    }

    /// Materializes the presented surface, evaluating it as a tiny-Lisp
    /// expression when it begins with `(` (e.g. a single-term dictionary
    /// entry whose surface computes today's date). `key()` and the
    /// lattice's internal scoring always use the stored literal instead;
    /// only the text a host shows the user goes through the evaluator.
    pub fn resolved_surface(&self) -> anyhow::Result<String> {
        if self.surface.starts_with('(') {
            crate::lisp::run(&self.surface)
        } else {
            Ok(self.surface.clone())
        }
    }
}

pub struct GraphResolver;

impl GraphResolver {
    /// Enumerates lattice candidates for `yomi` and assembles them into a
    /// [`Graph`]. `forced_slices`, when given, restricts segmentation to
    /// exactly those slices; otherwise every substring is considered.
    #[allow(clippy::too_many_arguments)]
    pub fn build_graph(
        yomi: &str,
        forced_slices: Option<&[ForcedSlice]>,
        normal_dicts: &[&dyn KanaKanjiDict],
        single_term_dicts: &[&dyn KanaKanjiDict],
        user_lm: &UserLanguageModel,
        sys_uni_lm: &dyn SystemUnigramLM,
    ) -> Graph {
        let chars: Vec<char> = yomi.chars().collect();
        let input_length = chars.len();

        let node_groups = match forced_slices {
            Some(slices) => Self::enumerate_constrained(
                &chars,
                slices,
                normal_dicts,
                single_term_dicts,
                sys_uni_lm,
            ),
            None => Self::enumerate_unconstrained(
                &chars,
                normal_dicts,
                single_term_dicts,
                user_lm,
                sys_uni_lm,
            ),
        };

        Graph::build(input_length as i32, node_groups)
    }

    fn candidates_for_slice(
        i: usize,
        y: &str,
        is_whole_input: bool,
        normal_dicts: &[&dyn KanaKanjiDict],
        single_term_dicts: &[&dyn KanaKanjiDict],
        sys_uni_lm: &dyn SystemUnigramLM,
        seen_by_yomi: bool,
    ) -> Vec<Node> {
        let mut surfaces = OrderedSurfaces::default();
        for dict in normal_dicts {
            for surface in dict.find_kanjis(y) {
                surfaces.insert(surface);
            }
        }
        if is_whole_input {
            for dict in single_term_dicts {
                for surface in dict.find_kanjis(y) {
                    surfaces.insert(surface);
                }
            }
        }
        let had_dict_hit = !surfaces.is_empty();

        if had_dict_hit || seen_by_yomi {
            surfaces.insert(y.to_string());
            surfaces.insert(hira2kata(y, ConvOption::default()));
        }

        if is_whole_input && surfaces.is_empty() {
            surfaces.insert(y.to_string());
            surfaces.insert(hira2kata(y, ConvOption::default()));
        }

        surfaces
            .into_vec()
            .into_iter()
            .map(|surface| Node::new(i as i32, &surface, y, sys_uni_lm))
            .collect()
    }

    fn enumerate_unconstrained(
        chars: &[char],
        normal_dicts: &[&dyn KanaKanjiDict],
        single_term_dicts: &[&dyn KanaKanjiDict],
        user_lm: &UserLanguageModel,
        sys_uni_lm: &dyn SystemUnigramLM,
    ) -> Vec<(i32, Vec<Node>)> {
        let n = chars.len();
        let mut groups: Vec<(i32, Vec<Node>)> = Vec::new();

        for i in 0..n {
            let mut nodes_at_i = Vec::new();
            for j in 1..=(n - i) {
                let y: String = chars[i..i + j].iter().collect();
                let is_whole_input = i == 0 && j == n;
                let seen_by_yomi = user_lm.has_unigram_cost_by_yomi(&y);

                let candidates = Self::candidates_for_slice(
                    i,
                    &y,
                    is_whole_input,
                    normal_dicts,
                    single_term_dicts,
                    sys_uni_lm,
                    seen_by_yomi,
                );
                nodes_at_i.extend(candidates);
            }
            groups.push((i as i32, nodes_at_i));
        }

        groups
    }

    fn enumerate_constrained(
        chars: &[char],
        slices: &[ForcedSlice],
        normal_dicts: &[&dyn KanaKanjiDict],
        single_term_dicts: &[&dyn KanaKanjiDict],
        sys_uni_lm: &dyn SystemUnigramLM,
    ) -> Vec<(i32, Vec<Node>)> {
        let n = chars.len();
        let mut groups = Vec::new();

        for slice in slices {
            let y: String = chars[slice.start..slice.end].iter().collect();
            let is_whole_input = slice.start == 0 && slice.end == n;

            let mut surfaces = OrderedSurfaces::default();
            for dict in normal_dicts {
                for surface in dict.find_kanjis(&y) {
                    surfaces.insert(surface);
                }
            }
            if is_whole_input {
                for dict in single_term_dicts {
                    for surface in dict.find_kanjis(&y) {
                        surfaces.insert(surface);
                    }
                }
            }
            surfaces.insert(y.clone());
            surfaces.insert(hira2kata(&y, ConvOption::default()));

            let nodes: Vec<Node> = surfaces
                .into_vec()
                .into_iter()
                .map(|surface| Node::new(slice.start as i32, &surface, &y, sys_uni_lm))
                .collect();
            groups.push((slice.start as i32, nodes));
        }

        groups
    }

    /// Maximum-score dynamic program over `graph`'s nodes in ascending
    /// start order.
    pub fn fill(
        graph: &Graph,
        user_lm: &UserLanguageModel,
        sys_bi_lm: &dyn SystemBigramLM,
    ) {
        for idx in graph.nodes_by_start() {
            if idx == graph.bos_index() {
                continue;
            }
            let node = graph.node(idx);
            let u = node.calc_node_cost(user_lm);

            let prevs = graph.get_prev_items(node);
            if prevs.is_empty() {
                error!(
                    "lattice node {:?} has no predecessor during forward fill; graph is malformed",
                    node.key()
                );
                node.set_total_cost(f32::MIN);
                continue;
            }

            let mut best: Option<(NodeIndex, f32)> = None;
            for &p_idx in &prevs {
                let p = graph.node(p_idx);
                let c = p.total_cost() + p.get_bigram_cost(node, user_lm, sys_bi_lm) + u;
                if best.map(|(_, best_c)| c > best_c).unwrap_or(true) {
                    best = Some((p_idx, c));
                }
            }
            let (best_prev, best_cost) = best.expect("prevs is non-empty");
            node.set_prev(best_prev);
            node.set_total_cost(best_cost);
        }
    }

    /// Walks backward from EOS to BOS, returning one candidate list per
    /// segment (outermost segment first).
    pub fn n_best(graph: &Graph, sys_bi_lm: &dyn SystemBigramLM) -> Vec<Vec<Candidate>> {
        let mut segments: Vec<Vec<Candidate>> = Vec::new();

        let mut succ_idx = graph.eos_index();
        let Some(mut current_idx) = graph.node(succ_idx).prev() else {
            return segments;
        };

        while current_idx != graph.bos_index() {
            let node = graph.node(current_idx);
            let succ = graph.node(succ_idx);

            let mut alternatives = graph.get_items_by_start_and_length(node);
            alternatives.sort_by(|&a_idx, &b_idx| {
                let a = graph.node(a_idx);
                let b = graph.node(b_idx);
                let a_score = a.total_cost() + a.get_bigram_cost_from_cache(succ);
                let b_score = b.total_cost() + b.get_bigram_cost_from_cache(succ);
                b_score.partial_cmp(&a_score).unwrap_or(std::cmp::Ordering::Equal)
            });

            segments.push(
                alternatives
                    .iter()
                    .map(|&idx| {
                        let n = graph.node(idx);
                        Candidate {
                            surface: n.surface.clone(),
                            yomi: n.yomi.clone(),
                        }
                    })
                    .collect(),
            );

            succ_idx = current_idx;
            let Some(prev_idx) = node.prev() else {
                break;
            };
            current_idx = prev_idx;
        }

        segments.reverse();
        segments
    }
}
