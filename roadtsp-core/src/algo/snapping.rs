//! Integration of external points into the network
//!
//! Each point is projected onto the nearest edge segment. A projection close
//! to an existing node reuses it; otherwise the edge is split at the
//! projection so the point becomes a regular routable node.

use geo::Point;
use hashbrown::HashSet;
use log::{info, trace, warn};

use crate::{
    Distance, Error,
    config::PointsConfig,
    model::{IntegratedPoint, NetworkGraph, PointRecord, SnapKind, network::SegmentRef},
};

/// Point rejected during integration, with the reason
#[derive(Debug)]
pub struct RejectedPoint {
    pub id: String,
    pub error: Error,
}

/// Result of integrating one batch of points
#[derive(Debug, Default)]
pub struct IntegrationOutcome {
    pub points: Vec<IntegratedPoint>,
    pub rejected: Vec<RejectedPoint>,
    /// Rows seen in the batch
    pub total: usize,
}

/// Nearest location on the network for a query point
#[derive(Debug, Clone, Copy)]
struct NetworkLocation {
    segment: SegmentRef,
    location: Point<f64>,
    distance: Distance,
}

#[derive(Debug, Clone)]
pub struct PointIntegrator {
    config: PointsConfig,
}

impl PointIntegrator {
    pub fn new(config: PointsConfig) -> Self {
        Self { config }
    }

    /// Snaps every record of the batch onto `graph`, splitting edges as needed
    ///
    /// Points beyond the maximum snap distance are reported in
    /// [`IntegrationOutcome::rejected`] and leave the graph untouched.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicatePoint`] if an id repeats within the batch; the graph
    /// is not modified in that case.
    pub fn integrate(
        &self,
        graph: &mut NetworkGraph,
        records: &[PointRecord],
    ) -> Result<IntegrationOutcome, Error> {
        ensure_unique_ids(records)?;

        let mut outcome = IntegrationOutcome {
            total: records.len(),
            ..Default::default()
        };

        for record in records {
            match self.snap(graph, record) {
                Ok(point) => outcome.points.push(point),
                Err(error) => {
                    warn!("Point {} rejected: {error}", record.id);
                    outcome.rejected.push(RejectedPoint {
                        id: record.id.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            "Integrated {} of {} points ({} edges after splitting)",
            outcome.points.len(),
            outcome.total,
            graph.edge_count()
        );
        Ok(outcome)
    }

    fn snap(&self, graph: &mut NetworkGraph, record: &PointRecord) -> Result<IntegratedPoint, Error> {
        let metric = graph.metric();
        let nearest = nearest_location(graph, record.geometry).ok_or(Error::NoNetworkLoaded)?;

        if nearest.distance > self.config.max_snap_distance {
            return Err(Error::SnapTolerance {
                id: record.id.clone(),
                distance: nearest.distance,
                max: self.config.max_snap_distance,
            });
        }

        let existing = graph.nearest_node(nearest.location).filter(|node| {
            graph.node(*node).is_some_and(|n| {
                metric.distance(n.geometry, nearest.location) <= self.config.node_snap_tolerance
            })
        });

        let (node, snap) = match existing {
            Some(node) => (node, SnapKind::ExistingNode),
            None => {
                let (node, inserted) = graph
                    .split_edge(
                        nearest.segment.edge,
                        nearest.segment.segment,
                        nearest.location.into(),
                    )
                    .ok_or_else(|| {
                        Error::InputFormat(format!(
                            "point {} projects onto an unknown edge segment",
                            record.id
                        ))
                    })?;
                let snap = if inserted {
                    SnapKind::SplitEdge
                } else {
                    SnapKind::ExistingNode
                };
                (node, snap)
            }
        };

        let snapped = graph
            .node(node)
            .map_or(nearest.location, |node| node.geometry);

        trace!(
            "Point {} snapped to node {} ({}) at distance {:.3}",
            record.id,
            node.index(),
            snap.as_str(),
            nearest.distance
        );

        Ok(IntegratedPoint {
            id: record.id.clone(),
            original: record.geometry,
            snapped,
            node,
            snap,
            distance_to_edge: nearest.distance,
        })
    }
}

pub(crate) fn ensure_unique_ids(records: &[PointRecord]) -> Result<(), Error> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(Error::DuplicatePoint(record.id.clone()));
        }
    }
    Ok(())
}

/// Projection of `at` onto the closest edge segment, measured in the
/// network metric
///
/// Segments arrive in planar order. The walk stops once the metric lower
/// bound of the next planar distance exceeds the best match, so every
/// segment that could be closer in the metric has been measured.
fn nearest_location(graph: &NetworkGraph, at: Point<f64>) -> Option<NetworkLocation> {
    let metric = graph.metric();
    let query = [at.x(), at.y()];
    let max_abs_latitude = graph.max_abs_latitude().max(at.y().abs());
    let mut best: Option<NetworkLocation> = None;

    for (segment, planar) in graph.nearest_segments(at) {
        if best.is_some_and(|best| {
            metric.planar_lower_bound(planar, max_abs_latitude) > best.distance
        }) {
            break;
        }

        let [x, y] = segment.geom().nearest_point(&query);
        let location = Point::new(x, y);
        let distance = metric.distance(at, location);
        if best.is_none_or(|best| distance < best.distance) {
            best = Some(NetworkLocation {
                segment: segment.data,
                location,
                distance,
            });
        }
    }
    best
}
