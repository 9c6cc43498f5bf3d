use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet, hash_map::Entry};

use super::state::State;
use crate::{
    Distance, NetworkEdgeId, NetworkNodeId, model::NetworkGraph, routing::path::RoadPath,
};

/// Result of a single-source search: settled distances plus the edge used to
/// reach every node, so paths can be rebuilt on demand
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    source: NetworkNodeId,
    distances: HashMap<NetworkNodeId, Distance>,
    predecessors: HashMap<NetworkNodeId, (NetworkNodeId, NetworkEdgeId)>,
}

impl ShortestPathTree {
    pub fn source(&self) -> NetworkNodeId {
        self.source
    }

    /// Distance to `node`, `None` when it was not reached
    pub fn distance(&self, node: NetworkNodeId) -> Option<Distance> {
        self.distances.get(&node).copied()
    }

    /// Rebuilds the path from the source to `target`
    pub fn path_to(&self, target: NetworkNodeId) -> Option<RoadPath> {
        let length = self.distance(target)?;

        let mut nodes = vec![target];
        let mut edges = Vec::new();
        let mut current = target;
        while current != self.source {
            let &(previous, edge) = self.predecessors.get(&current)?;
            nodes.push(previous);
            edges.push(edge);
            current = previous;
        }
        nodes.reverse();
        edges.reverse();

        Some(RoadPath {
            length,
            nodes,
            edges,
        })
    }
}

/// Dijkstra's algorithm over the road network, recording predecessors
///
/// With `targets`, the search stops as soon as every target is settled;
/// distances of other nodes may then be provisional.
pub fn traced_dijkstra(
    graph: &NetworkGraph,
    start: NetworkNodeId,
    targets: Option<&HashSet<NetworkNodeId>>,
) -> ShortestPathTree {
    let estimated_nodes = graph.node_count().min(4096);
    let mut distances: HashMap<NetworkNodeId, Distance> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NetworkNodeId, (NetworkNodeId, NetworkEdgeId)> =
        HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);
    let mut pending: Option<HashSet<NetworkNodeId>> = targets.cloned();

    // Start node has distance 0
    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if distances.get(&node).is_some_and(|&best| cost > best) {
            continue;
        }

        if let Some(remaining) = pending.as_mut() {
            remaining.remove(&node);
            if remaining.is_empty() {
                break;
            }
        }

        for (edge, next, length) in graph.neighbors(node) {
            let next_cost = cost + length;

            match distances.entry(next) {
                Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                    predecessors.insert(next, (node, edge));
                }
                Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                        predecessors.insert(next, (node, edge));
                    }
                }
            }
        }
    }

    ShortestPathTree {
        source: start,
        distances,
        predecessors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LengthMetric;
    use geo::{Point, line_string};

    // a - b - c plus a long detour a - c
    fn triangle() -> (NetworkGraph, [NetworkNodeId; 3]) {
        let mut graph = NetworkGraph::new(LengthMetric::Euclidean);
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(0.0, 1.0));
        let c = graph.add_node(Point::new(1.0, 1.0));
        graph.add_edge(a, b, line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0)]);
        graph.add_edge(b, c, line_string![(x: 0.0, y: 1.0), (x: 1.0, y: 1.0)]);
        graph.add_edge(
            a,
            c,
            line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 1.0, y: 1.0)],
        );
        (graph, [a, b, c])
    }

    #[test]
    fn finds_shortest_path_with_edges() {
        let (graph, [a, b, c]) = triangle();
        let tree = traced_dijkstra(&graph, a, None);
        assert_eq!(tree.distance(c), Some(2.0));

        let path = tree.path_to(c).unwrap();
        assert_eq!(path.nodes, vec![a, b, c]);
        assert_eq!(path.edges.len(), 2);
        assert_eq!(path.length, 2.0);
    }

    #[test]
    fn path_to_source_is_trivial() {
        let (graph, [a, ..]) = triangle();
        let path = traced_dijkstra(&graph, a, None).path_to(a).unwrap();
        assert_eq!(path.nodes, vec![a]);
        assert!(path.edges.is_empty());
        assert_eq!(path.length, 0.0);
    }

    #[test]
    fn unreachable_nodes_have_no_distance() {
        let (mut graph, [a, ..]) = triangle();
        let island = graph.add_node(Point::new(9.0, 9.0));
        let tree = traced_dijkstra(&graph, a, None);
        assert_eq!(tree.distance(island), None);
        assert!(tree.path_to(island).is_none());
    }

    #[test]
    fn stops_early_with_targets() {
        let (graph, [a, b, c]) = triangle();
        let targets: HashSet<_> = [b].into_iter().collect();
        let tree = traced_dijkstra(&graph, a, Some(&targets));
        assert_eq!(tree.distance(b), Some(1.0));
        // c may only hold a provisional value through the detour
        assert!(tree.distance(c).is_none_or(|d| d >= 2.0));
    }
}
