use crate::{Distance, NetworkEdgeId, NetworkNodeId};

/// Shortest path between two network nodes
///
/// `nodes` has one more element than `edges`; `edges[k]` joins `nodes[k]`
/// and `nodes[k + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadPath {
    pub length: Distance,
    pub nodes: Vec<NetworkNodeId>,
    pub edges: Vec<NetworkEdgeId>,
}

impl RoadPath {
    /// Zero-length path staying at `node`
    pub fn trivial(node: NetworkNodeId) -> Self {
        Self {
            length: 0.0,
            nodes: vec![node],
            edges: Vec::new(),
        }
    }

    /// Same path walked backwards; lengths are direction independent
    pub fn reversed(&self) -> Self {
        Self {
            length: self.length,
            nodes: self.nodes.iter().rev().copied().collect(),
            edges: self.edges.iter().rev().copied().collect(),
        }
    }
}
