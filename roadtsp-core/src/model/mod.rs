//! Data model for the road network and the points integrated into it

pub mod network;
pub mod points;

pub use network::{NetworkGraph, RoadEdge, RoadNode};
pub use points::{IntegratedPoint, PointRecord, SnapKind};
