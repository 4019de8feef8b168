//! The lattice itself: an arena of [`Node`]s plus the indexes the resolver
//! needs — by end position (for forward fill's predecessor lookup) and by
//! (start, length) (for N-best's same-segment alternative lookup).

use std::collections::BTreeMap;

use crate::graph::node::{Node, NodeIndex};

pub struct Graph {
    nodes: Vec<Node>,
    by_end_pos: BTreeMap<i32, Vec<NodeIndex>>,
    bos_index: NodeIndex,
    eos_index: NodeIndex,
}

impl Graph {
    /// `input_length` is the character count of the (already hiragana)
    /// convertible head. `node_groups` is `(start_pos, nodes)` as produced
    /// by candidate enumeration; a synthetic BOS/EOS is appended here.
    pub fn build(input_length: i32, mut node_groups: Vec<(i32, Vec<Node>)>) -> Graph {
        node_groups.sort_by_key(|(start, _)| *start);

        let mut nodes = Vec::new();
        let bos = Node::create_bos();
        nodes.push(bos);
        let bos_index = 0;

        for (_, group) in node_groups {
            for node in group {
                nodes.push(node);
            }
        }

        let eos = Node::create_eos(input_length);
        nodes.push(eos);
        let eos_index = nodes.len() - 1;

        let mut by_end_pos: BTreeMap<i32, Vec<NodeIndex>> = BTreeMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            let end = if idx == bos_index {
                0
            } else if idx == eos_index {
                node.start_pos
            } else {
                node.end_pos()
            };
            by_end_pos.entry(end).or_default().push(idx);
        }

        Graph {
            nodes,
            by_end_pos,
            bos_index,
            eos_index,
        }
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx]
    }

    pub fn bos_index(&self) -> NodeIndex {
        self.bos_index
    }

    pub fn eos_index(&self) -> NodeIndex {
        self.eos_index
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in ascending start position, BOS first, EOS last. This is the
    /// iteration order the forward fill walks.
    pub fn nodes_by_start(&self) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = (0..self.nodes.len()).collect();
        indices.sort_by_key(|&idx| {
            let node = &self.nodes[idx];
            if idx == self.bos_index {
                (i32::MIN, 0usize)
            } else {
                (node.start_pos, idx)
            }
        });
        indices
    }

    /// All nodes ending exactly where `node` starts.
    pub fn get_prev_items(&self, node: &Node) -> Vec<NodeIndex> {
        self.by_end_pos.get(&node.start_pos).cloned().unwrap_or_default()
    }

    /// All nodes sharing `node`'s exact (start, yomi length) — the
    /// candidate alternatives for one lattice segment.
    pub fn get_items_by_start_and_length(&self, node: &Node) -> Vec<NodeIndex> {
        let target_len = node.yomi.chars().count();
        self.by_end_pos
            .get(&node.end_pos())
            .into_iter()
            .flatten()
            .copied()
            .filter(|&idx| {
                let candidate = &self.nodes[idx];
                candidate.start_pos == node.start_pos
                    && candidate.yomi.chars().count() == target_len
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::MarisaSystemUnigramLMBuilder;

    fn dummy_lm() -> crate::lm::MarisaSystemUnigramLM {
        MarisaSystemUnigramLMBuilder::new().build().unwrap()
    }

    #[test]
    fn bos_and_eos_are_present_and_singular() {
        let graph = Graph::build(2, vec![]);
        assert_eq!(graph.len(), 2);
        assert!(graph.node(graph.bos_index()).is_bos());
        assert!(graph.node(graph.eos_index()).is_eos());
    }

    #[test]
    fn prev_items_indexes_by_end_position() {
        let lm = dummy_lm();
        let n1 = Node::new(0, "a", "a", &lm);
        let graph = Graph::build(1, vec![(0, vec![n1])]);

        let eos = graph.node(graph.eos_index());
        let prevs = graph.get_prev_items(eos);
        assert_eq!(prevs.len(), 1);
        assert_eq!(graph.node(prevs[0]).start_pos, 0);
    }

    #[test]
    fn items_by_start_and_length_groups_alternatives() {
        let lm = dummy_lm();
        let a = Node::new(0, "猫", "ねこ", &lm);
        let b = Node::new(0, "根子", "ねこ", &lm);
        let graph = Graph::build(2, vec![(0, vec![a, b])]);

        let first = graph.node(1);
        let alts = graph.get_items_by_start_and_length(first);
        assert_eq!(alts.len(), 2);
    }
}
