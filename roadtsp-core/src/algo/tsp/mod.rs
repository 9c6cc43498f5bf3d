//! Traveling salesman solvers over a [`CostMatrix`](crate::routing::CostMatrix)
//!
//! All solvers keep point 0 as the first visited point; a cycle returns to it
//! implicitly, so tours list every point exactly once.

mod annealing;
mod brute_force;
mod nearest_neighbor;
mod tour;

pub use annealing::SimulatedAnnealingSolver;
pub use brute_force::BruteForceSolver;
pub use nearest_neighbor::{NearestNeighborSolver, nearest_neighbor_order};
pub use tour::{Algorithm, Tour, TourResult};

use crate::{CancelFlag, Error, config::TourKind, routing::CostMatrix};

/// Common interface of the compared strategies
pub trait TspSolver {
    fn algorithm(&self) -> Algorithm;

    /// Produces a tour visiting every point of `costs` exactly once
    fn solve(&self, costs: &CostMatrix, kind: TourKind, cancel: &CancelFlag) -> Result<Tour, Error>;
}
