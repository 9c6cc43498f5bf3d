//! Routable road network

pub mod components;
pub mod graph;

pub use components::{RoadEdge, RoadNode};
pub use graph::{IndexedNode, IndexedSegment, NetworkGraph, SegmentRef};
