//! Algorithms over the network: point snapping, TSP solvers and the
//! evaluator comparing them

pub mod evaluation;
pub mod snapping;
pub mod tsp;

pub use evaluation::{Evaluation, Evaluator};
pub use snapping::{IntegrationOutcome, PointIntegrator, RejectedPoint};
pub use tsp::{
    Algorithm, BruteForceSolver, NearestNeighborSolver, SimulatedAnnealingSolver, Tour,
    TourResult, TspSolver,
};
