//! External points and their position on the network

use geo::Point;

use crate::{Distance, NetworkNodeId};

/// Point as read from an upload, before snapping
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub id: String,
    /// Longitude/latitude as x/y
    pub geometry: Point<f64>,
}

impl PointRecord {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            geometry: Point::new(lon, lat),
        }
    }
}

/// How a point became routable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapKind {
    /// Projection fell within tolerance of an existing node
    ExistingNode,
    /// A new node was inserted, splitting the nearest edge
    SplitEdge,
}

impl SnapKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapKind::ExistingNode => "existing_node",
            SnapKind::SplitEdge => "split_edge",
        }
    }
}

/// Point snapped onto the network
#[derive(Debug, Clone)]
pub struct IntegratedPoint {
    pub id: String,
    pub original: Point<f64>,
    /// Location of `node`, the routable position of the point
    pub snapped: Point<f64>,
    pub node: NetworkNodeId,
    pub snap: SnapKind,
    /// Distance from the original position to the nearest network location
    pub distance_to_edge: Distance,
}
