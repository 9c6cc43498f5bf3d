//! Road network components - nodes and edges

use geo::{Coord, LineString, Point};

use crate::{Distance, config::LengthMetric};

/// Network node: a shared endpoint or a point inserted while snapping
#[derive(Debug, Clone)]
pub struct RoadNode {
    pub geometry: Point<f64>,
}

/// Undirected road segment with its full polyline
#[derive(Debug, Clone)]
pub struct RoadEdge {
    /// Sum of segment lengths in the network metric
    pub length: Distance,
    /// Vertices ordered from the edge source to the edge target
    pub geometry: LineString<f64>,
}

impl RoadEdge {
    pub fn new(geometry: LineString<f64>, metric: LengthMetric) -> Self {
        let length = polyline_length(&geometry, metric);
        Self { length, geometry }
    }

    /// Vertices in traversal order, reversed when walking target to source
    pub fn oriented_coords(&self, forward: bool) -> Box<dyn Iterator<Item = Coord<f64>> + '_> {
        if forward {
            Box::new(self.geometry.0.iter().copied())
        } else {
            Box::new(self.geometry.0.iter().rev().copied())
        }
    }
}

pub(crate) fn polyline_length(line: &LineString<f64>, metric: LengthMetric) -> Distance {
    line.lines()
        .map(|segment| metric.distance(segment.start.into(), segment.end.into()))
        .sum()
}
