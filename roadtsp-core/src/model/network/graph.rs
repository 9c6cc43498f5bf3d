use geo::{Coord, LineString, Point};
use hashbrown::HashSet;
use petgraph::stable_graph::StableUnGraph;
use petgraph::unionfind::UnionFind;
use petgraph::visit::{EdgeRef, NodeIndexable};
use rstar::RTree;
use rstar::primitives::{GeomWithData, Line};

use super::components::{RoadEdge, RoadNode};
use crate::{Distance, NetworkEdgeId, NetworkNodeId, config::LengthMetric};

/// Node position in the spatial index
pub type IndexedNode = GeomWithData<[f64; 2], NetworkNodeId>;
/// Single straight piece of an edge polyline in the spatial index
pub type IndexedSegment = GeomWithData<Line<[f64; 2]>, SegmentRef>;

/// Locates one straight piece of an edge polyline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRef {
    pub edge: NetworkEdgeId,
    /// Index of the first vertex of the piece within the edge geometry
    pub segment: usize,
}

/// Node/edge arena with adjacency and spatial indices over nodes and
/// edge segments.
///
/// Edge removal keeps the remaining ids stable, so snapping can split edges
/// without invalidating handles held elsewhere in the graph.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    pub(crate) graph: StableUnGraph<RoadNode, RoadEdge>,
    node_index: RTree<IndexedNode>,
    segment_index: RTree<IndexedSegment>,
    metric: LengthMetric,
    /// Largest `|y|` of any edge vertex indexed so far; never shrinks
    max_abs_y: f64,
}

impl NetworkGraph {
    pub fn new(metric: LengthMetric) -> Self {
        Self {
            graph: StableUnGraph::default(),
            node_index: RTree::new(),
            segment_index: RTree::new(),
            metric,
            max_abs_y: 0.0,
        }
    }

    pub fn metric(&self) -> LengthMetric {
        self.metric
    }

    /// Upper bound on the absolute latitude of every edge vertex
    pub fn max_abs_latitude(&self) -> f64 {
        self.max_abs_y
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn total_length(&self) -> Distance {
        self.edges().map(|(_, edge)| edge.length).sum()
    }

    /// Number of connected components
    pub fn component_count(&self) -> usize {
        let mut components = UnionFind::new(self.graph.node_bound());
        for edge in self.graph.edge_indices() {
            if let Some((a, b)) = self.graph.edge_endpoints(edge) {
                components.union(a.index(), b.index());
            }
        }
        self.graph
            .node_indices()
            .map(|node| components.find(node.index()))
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn node(&self, id: NetworkNodeId) -> Option<&RoadNode> {
        self.graph.node_weight(id)
    }

    pub fn edge(&self, id: NetworkEdgeId) -> Option<&RoadEdge> {
        self.graph.edge_weight(id)
    }

    pub fn edge_endpoints(&self, id: NetworkEdgeId) -> Option<(NetworkNodeId, NetworkNodeId)> {
        self.graph.edge_endpoints(id)
    }

    /// All edges in id order
    pub fn edges(&self) -> impl Iterator<Item = (NetworkEdgeId, &RoadEdge)> {
        self.graph
            .edge_indices()
            .filter_map(|id| self.graph.edge_weight(id).map(|edge| (id, edge)))
    }

    /// Incident edges of `node` as `(edge, neighbor, length)`
    pub fn neighbors(
        &self,
        node: NetworkNodeId,
    ) -> impl Iterator<Item = (NetworkEdgeId, NetworkNodeId, Distance)> + '_ {
        self.graph.edges(node).map(move |edge| {
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            (edge.id(), next, edge.weight().length)
        })
    }

    pub fn add_node(&mut self, geometry: Point<f64>) -> NetworkNodeId {
        let id = self.graph.add_node(RoadNode { geometry });
        self.node_index
            .insert(GeomWithData::new([geometry.x(), geometry.y()], id));
        id
    }

    /// Reuses a node within `tolerance` coordinate units, or creates one
    pub fn find_or_insert_node(&mut self, geometry: Point<f64>, tolerance: f64) -> NetworkNodeId {
        let query = [geometry.x(), geometry.y()];
        if let Some(existing) = self
            .node_index
            .nearest_neighbor(&query)
            .filter(|candidate| squared_distance(candidate.geom(), &query) <= tolerance * tolerance)
        {
            return existing.data;
        }
        self.add_node(geometry)
    }

    /// Nearest node in coordinate space
    pub fn nearest_node(&self, at: Point<f64>) -> Option<NetworkNodeId> {
        self.node_index
            .nearest_neighbor(&[at.x(), at.y()])
            .map(|node| node.data)
    }

    /// Edge segments with their planar distance to `at`, nearest first
    pub fn nearest_segments(
        &self,
        at: Point<f64>,
    ) -> impl Iterator<Item = (&IndexedSegment, f64)> {
        self.segment_index
            .nearest_neighbor_iter_with_distance_2(&[at.x(), at.y()])
            .map(|(segment, distance_2)| (segment, distance_2.sqrt()))
    }

    pub fn add_edge(
        &mut self,
        source: NetworkNodeId,
        target: NetworkNodeId,
        geometry: LineString<f64>,
    ) -> NetworkEdgeId {
        let segments = segment_lines(&geometry);
        self.max_abs_y = geometry
            .coords()
            .fold(self.max_abs_y, |max, coord| max.max(coord.y.abs()));
        let id = self
            .graph
            .add_edge(source, target, RoadEdge::new(geometry, self.metric));
        for (segment, line) in segments.into_iter().enumerate() {
            self.segment_index
                .insert(GeomWithData::new(line, SegmentRef { edge: id, segment }));
        }
        id
    }

    pub fn remove_edge(&mut self, id: NetworkEdgeId) -> Option<RoadEdge> {
        let edge = self.graph.remove_edge(id)?;
        for (segment, line) in segment_lines(&edge.geometry).into_iter().enumerate() {
            self.segment_index
                .remove(&GeomWithData::new(line, SegmentRef { edge: id, segment }));
        }
        Some(edge)
    }

    /// Splits `edge` at `at`, which must lie on the piece starting at vertex
    /// `segment`. Returns the node at the split location and whether it was
    /// newly inserted; a split landing on an edge endpoint reuses that node.
    pub(crate) fn split_edge(
        &mut self,
        edge: NetworkEdgeId,
        segment: usize,
        at: Coord<f64>,
    ) -> Option<(NetworkNodeId, bool)> {
        let (source, target) = self.graph.edge_endpoints(edge)?;
        let coords = &self.graph.edge_weight(edge)?.geometry.0;
        if segment + 1 >= coords.len() {
            return None;
        }

        let mut head: Vec<Coord<f64>> = coords[..=segment].to_vec();
        let mut tail: Vec<Coord<f64>> = coords[segment + 1..].to_vec();
        if head.last() != Some(&at) {
            head.push(at);
        }
        if tail.first() != Some(&at) {
            tail.insert(0, at);
        }

        if head.len() < 2 {
            return Some((source, false));
        }
        if tail.len() < 2 {
            return Some((target, false));
        }

        self.remove_edge(edge)?;
        let node = self.add_node(at.into());
        self.add_edge(source, node, LineString::new(head));
        self.add_edge(node, target, LineString::new(tail));
        Some((node, true))
    }
}

fn segment_lines(geometry: &LineString<f64>) -> Vec<Line<[f64; 2]>> {
    geometry
        .lines()
        .map(|line| Line::new([line.start.x, line.start.y], [line.end.x, line.end.y]))
        .collect()
}

fn squared_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}
