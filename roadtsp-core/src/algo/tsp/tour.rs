use std::fmt;
use std::time::Duration;

use fixedbitset::FixedBitSet;
use geo::LineString;

use crate::{Distance, PointIndex, config::TourKind, routing::CostMatrix};

/// Compared solving strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    BruteForce,
    NearestNeighbor,
    SimulatedAnnealing,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::BruteForce,
        Algorithm::NearestNeighbor,
        Algorithm::SimulatedAnnealing,
    ];

    /// Key used in evaluation responses
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::BruteForce => "bruteforce",
            Algorithm::NearestNeighbor => "nearest_neighbor",
            Algorithm::SimulatedAnnealing => "simulated_annealing",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Visiting order of all points with its total length
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    order: Vec<PointIndex>,
    kind: TourKind,
    length: Distance,
}

impl Tour {
    /// Measures `order` on `costs`
    pub fn new(order: Vec<PointIndex>, costs: &CostMatrix, kind: TourKind) -> Self {
        let length = costs.tour_length(&order, kind);
        Self {
            order,
            kind,
            length,
        }
    }

    pub fn order(&self) -> &[PointIndex] {
        &self.order
    }

    pub fn kind(&self) -> TourKind {
        self.kind
    }

    pub fn length(&self) -> Distance {
        self.length
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// True when every index in `0..size` appears exactly once
    pub fn is_permutation_of(&self, size: usize) -> bool {
        if self.order.len() != size {
            return false;
        }
        let mut seen = FixedBitSet::with_capacity(size);
        self.order.iter().all(|&index| {
            let fresh = index < size && !seen.contains(index);
            if fresh {
                seen.insert(index);
            }
            fresh
        })
    }
}

/// Outcome of one solver run; immutable once produced
#[derive(Debug, Clone)]
pub struct TourResult {
    algorithm: Algorithm,
    tour: Tour,
    elapsed: Duration,
    route: LineString<f64>,
}

impl TourResult {
    pub fn new(algorithm: Algorithm, tour: Tour, elapsed: Duration, route: LineString<f64>) -> Self {
        Self {
            algorithm,
            tour,
            elapsed,
            route,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn distance(&self) -> Distance {
        self.tour.length()
    }

    /// Wall-clock time spent in the solver
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn route(&self) -> &LineString<f64> {
        &self.route
    }
}
