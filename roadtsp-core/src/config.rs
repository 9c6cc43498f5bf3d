//! Engine configuration
//!
//! Every field has a default so partial TOML documents deserialize cleanly.

use geo::{Distance as _, Euclidean, Haversine, Point};
use serde::Deserialize;

use crate::Distance;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub network: NetworkConfig,
    pub points: PointsConfig,
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Endpoints closer than this (in coordinate units) collapse into one node
    pub node_tolerance: f64,
    pub metric: LengthMetric,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            node_tolerance: 1e-9,
            metric: LengthMetric::Haversine,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    /// Points farther than this from every edge are rejected
    pub max_snap_distance: Distance,
    /// Projections this close to an existing node reuse the node
    pub node_snap_tolerance: Distance,
    pub upload_policy: UploadPolicy,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            max_snap_distance: 500.0,
            node_snap_tolerance: 1.0,
            upload_policy: UploadPolicy::Replace,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub tour_kind: TourKind,
    pub brute_force_max_points: usize,
    pub annealing: AnnealingConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tour_kind: TourKind::Cycle,
            brute_force_max_points: 10,
            annealing: AnnealingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    pub initial_temperature: f64,
    /// Geometric decay factor applied after every iteration
    pub cooling_rate: f64,
    pub iterations: usize,
    /// Annealing stops early once the temperature drops below this
    pub min_temperature: f64,
    /// Fixed seed for reproducible runs; `None` derives one from the clock
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            cooling_rate: 0.995,
            iterations: 5000,
            min_temperature: 1e-6,
            seed: None,
        }
    }
}

/// How lengths along the network are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthMetric {
    /// Great-circle distance in meters over lon/lat coordinates
    #[default]
    Haversine,
    /// Planar distance in coordinate units
    Euclidean,
}

/// Mean earth radius in meters, as used by [`Haversine`]
const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;

impl LengthMetric {
    pub fn distance(self, a: Point<f64>, b: Point<f64>) -> Distance {
        match self {
            LengthMetric::Haversine => Haversine.distance(a, b),
            LengthMetric::Euclidean => Euclidean.distance(a, b),
        }
    }

    /// Smallest metric distance two points can have when they are `planar`
    /// coordinate units apart and neither lies beyond `max_abs_latitude`.
    ///
    /// For haversine, `hav θ >= cos²(φmax) · (Δφ² + Δλ²) / π²` gives
    /// `θ >= 2/π · cos(φmax) · planar`, valid while `|Δλ| <= 180°`.
    pub fn planar_lower_bound(self, planar: f64, max_abs_latitude: f64) -> Distance {
        match self {
            LengthMetric::Euclidean => planar,
            LengthMetric::Haversine => {
                let cos_lat = max_abs_latitude.min(90.0).to_radians().cos().max(0.0);
                MEAN_EARTH_RADIUS * planar.to_radians() * cos_lat * 2.0 / std::f64::consts::PI
            }
        }
    }
}

/// Whether a tour returns to its starting point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TourKind {
    #[default]
    Cycle,
    /// Open path starting at point 0 without the closing leg
    Path,
}

/// What a new point batch does to the previously integrated set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadPolicy {
    #[default]
    Replace,
    Append,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_lower_bound_never_exceeds_the_metric() {
        let euclidean = LengthMetric::Euclidean;
        assert_eq!(euclidean.planar_lower_bound(2.5, 89.0), 2.5);

        let haversine = LengthMetric::Haversine;
        let origin = Point::<f64>::new(0.0, 60.0);
        for (dx, dy) in [(0.015, 0.0), (0.0, 0.01), (0.3, -0.2), (-1.0, 0.5)] {
            let other = Point::new(dx, 60.0 + dy);
            let planar = f64::hypot(dx, dy);
            let max_lat = origin.y().abs().max(other.y().abs());
            assert!(haversine.planar_lower_bound(planar, max_lat) <= haversine.distance(origin, other));
        }
        assert!(haversine.planar_lower_bound(1.0, 90.0) < 1e-6);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"solver": {"brute_force_max_points": 8, "annealing": {"seed": 7}}}"#,
        )
        .unwrap();
        assert_eq!(config.solver.brute_force_max_points, 8);
        assert_eq!(config.solver.annealing.seed, Some(7));
        assert_eq!(config.solver.annealing.iterations, 5000);
        assert_eq!(config.solver.tour_kind, TourKind::Cycle);
        assert_eq!(config.network.metric, LengthMetric::Haversine);
        assert_eq!(config.points.upload_policy, UploadPolicy::Replace);
    }

    #[test]
    fn metrics_disagree_on_units() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 1.0);
        assert!((LengthMetric::Euclidean.distance(a, b) - 1.0).abs() < 1e-12);
        // One degree of latitude is roughly 111 km
        let meters = LengthMetric::Haversine.distance(a, b);
        assert!((meters - 111_195.0).abs() < 100.0);
    }
}
