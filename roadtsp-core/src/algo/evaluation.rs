use std::time::Instant;

use log::info;

use super::tsp::{
    Algorithm, BruteForceSolver, NearestNeighborSolver, SimulatedAnnealingSolver, TourResult,
    TspSolver,
};
use crate::{
    CancelFlag, Error,
    config::SolverConfig,
    model::NetworkGraph,
    routing::{DistanceMatrix, RouteAssembler},
};

/// Results of all three solvers over the same distance matrix
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub bruteforce: TourResult,
    pub nearest_neighbor: TourResult,
    pub simulated_annealing: TourResult,
}

impl Evaluation {
    /// Results in [`Algorithm::ALL`] order
    pub fn results(&self) -> [&TourResult; 3] {
        [
            &self.bruteforce,
            &self.nearest_neighbor,
            &self.simulated_annealing,
        ]
    }

    pub fn get(&self, algorithm: Algorithm) -> &TourResult {
        match algorithm {
            Algorithm::BruteForce => &self.bruteforce,
            Algorithm::NearestNeighbor => &self.nearest_neighbor,
            Algorithm::SimulatedAnnealing => &self.simulated_annealing,
        }
    }
}

/// Runs every solver and assembles the routes they imply
pub struct Evaluator<'a> {
    graph: &'a NetworkGraph,
    matrix: &'a DistanceMatrix,
    config: &'a SolverConfig,
}

impl<'a> Evaluator<'a> {
    pub fn new(graph: &'a NetworkGraph, matrix: &'a DistanceMatrix, config: &'a SolverConfig) -> Self {
        Self {
            graph,
            matrix,
            config,
        }
    }

    /// Runs the solvers one after another, brute force first since it is
    /// the one most likely to refuse the input.
    ///
    /// # Errors
    ///
    /// [`Error::NoPointsIntegrated`] for an empty matrix. Any solver or
    /// assembly failure fails the whole evaluation.
    pub fn evaluate(&self, cancel: &CancelFlag) -> Result<Evaluation, Error> {
        if self.matrix.size() == 0 {
            return Err(Error::NoPointsIntegrated);
        }

        let bruteforce = self.run(
            &BruteForceSolver::new(self.config.brute_force_max_points),
            cancel,
        )?;
        let nearest_neighbor = self.run(&NearestNeighborSolver::new(), cancel)?;
        let simulated_annealing = self.run(
            &SimulatedAnnealingSolver::new(self.config.annealing.clone()),
            cancel,
        )?;

        Ok(Evaluation {
            bruteforce,
            nearest_neighbor,
            simulated_annealing,
        })
    }

    fn run(&self, solver: &dyn TspSolver, cancel: &CancelFlag) -> Result<TourResult, Error> {
        let algorithm = solver.algorithm();
        let kind = self.config.tour_kind;

        let started = Instant::now();
        let tour = solver.solve(self.matrix.costs(), kind, cancel)?;
        let elapsed = started.elapsed();

        if !tour.is_permutation_of(self.matrix.size()) {
            return Err(Error::InvalidTour(format!(
                "{algorithm} did not visit every point exactly once"
            )));
        }

        let route = RouteAssembler::new(self.graph, self.matrix).assemble(tour.order(), kind)?;

        info!(
            "{algorithm}: length {:.3} over {} points in {:.3?}",
            tour.length(),
            tour.len(),
            elapsed
        );
        Ok(TourResult::new(algorithm, tour, elapsed, route))
    }
}
