use std::cmp::Ordering;

use crate::NodeId;

/// Vertex of the search graph: a real node, or one of the two synthetic
/// endpoints placed part-way along the source and target branches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(super) enum Vertex {
    Source,
    Target,
    Node(NodeId),
}

impl Vertex {
    /// Dense index, with the synthetic endpoints placed after all node slots
    pub(super) fn index(self, node_bound: usize) -> usize {
        match self {
            Vertex::Node(node) => node.index(),
            Vertex::Source => node_bound,
            Vertex::Target => node_bound + 1,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub(super) struct State {
    pub(super) cost: f64,
    pub(super) vertex: Vertex,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other.cost.total_cmp(&self.cost)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
