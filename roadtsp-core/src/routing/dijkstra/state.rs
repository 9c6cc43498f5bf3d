use std::cmp::Ordering;

use crate::{Distance, NetworkNodeId};

#[derive(Copy, Clone, PartialEq)]
pub(super) struct State {
    pub(super) cost: Distance,
    pub(super) node: NetworkNodeId,
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
