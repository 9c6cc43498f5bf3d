//! Simulated annealing over 2-opt moves.
//!
//! Starts from the nearest neighbor tour and repeatedly reverses a random
//! sub-sequence `t[i..=j]` (1 <= i < j), keeping point 0 in front. A move
//! changes at most two tour edges, so its delta is computed in O(1):
//!
//! ```text
//! delta = d(t[i-1], t[j]) + d(t[i], next) - d(t[i-1], t[i]) - d(t[j], next)
//! ```
//!
//! where `next` is `t[j+1]`, `t[0]` when `j` is last in a cycle, and absent
//! when `j` is last in an open path. Worsening moves are accepted with
//! probability `exp(-delta / T)`; `T` decays geometrically. The best tour
//! seen is returned, so the result is never longer than the start tour.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, trace};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{Algorithm, Tour, TspSolver, nearest_neighbor_order};
use crate::{
    CancelFlag, Distance, Error, PointIndex,
    config::{AnnealingConfig, TourKind},
    routing::CostMatrix,
};

/// Iterations between two cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 256;

/// Relative drift the running length may carry before a candidate is
/// re-measured exactly
const RESYNC_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct SimulatedAnnealingSolver {
    config: AnnealingConfig,
}

impl SimulatedAnnealingSolver {
    pub fn new(config: AnnealingConfig) -> Self {
        Self { config }
    }

    /// Runs the schedule with a caller-provided generator
    pub fn solve_with_rng<R: Rng + ?Sized>(
        &self,
        costs: &CostMatrix,
        kind: TourKind,
        rng: &mut R,
        cancel: &CancelFlag,
    ) -> Result<Tour, Error> {
        let size = costs.size();
        let mut current = nearest_neighbor_order(costs, 0);
        if size < 3 {
            return Ok(Tour::new(current, costs, kind));
        }

        let mut current_length = costs.tour_length(&current, kind);
        let mut best = current.clone();
        let mut best_length = current_length;
        let mut temperature = self.config.initial_temperature;
        let mut accepted = 0usize;

        for iteration in 0..self.config.iterations {
            if iteration % CANCEL_CHECK_INTERVAL == 0 {
                cancel.check()?;
            }
            if temperature < self.config.min_temperature {
                break;
            }

            let i = rng.random_range(1..size - 1);
            let j = rng.random_range(i + 1..size);
            let delta = two_opt_delta(costs, &current, kind, i, j);

            if delta <= 0.0 || rng.random::<f64>() < (-delta / temperature).exp() {
                current[i..=j].reverse();
                current_length += delta;
                accepted += 1;

                if track_best(
                    costs,
                    kind,
                    &current,
                    &mut current_length,
                    &mut best,
                    &mut best_length,
                ) {
                    trace!("Annealing iteration {iteration}: best length {best_length:.3}");
                }
            }

            temperature *= self.config.cooling_rate;
        }

        debug!(
            "Annealing accepted {accepted} moves, best length {best_length:.3}, final temperature {temperature:.3e}"
        );
        Ok(Tour::new(best, costs, kind))
    }
}

impl TspSolver for SimulatedAnnealingSolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::SimulatedAnnealing
    }

    fn solve(&self, costs: &CostMatrix, kind: TourKind, cancel: &CancelFlag) -> Result<Tour, Error> {
        let seed = self.config.seed.unwrap_or_else(clock_seed);
        debug!("Annealing seed {seed}");
        let mut rng = StdRng::seed_from_u64(seed);
        self.solve_with_rng(costs, kind, &mut rng, cancel)
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

/// Records `current` as the best tour if it is strictly shorter.
///
/// The running length drifts with every accepted delta, so any candidate
/// within the drift margin of the best is re-measured exactly first.
fn track_best(
    costs: &CostMatrix,
    kind: TourKind,
    current: &[PointIndex],
    current_length: &mut Distance,
    best: &mut Vec<PointIndex>,
    best_length: &mut Distance,
) -> bool {
    if *current_length >= *best_length + RESYNC_TOLERANCE * best_length.abs().max(1.0) {
        return false;
    }
    *current_length = costs.tour_length(current, kind);
    if *current_length < *best_length {
        best.clear();
        best.extend_from_slice(current);
        *best_length = *current_length;
        true
    } else {
        false
    }
}

/// Length change of reversing `tour[i..=j]`, `1 <= i < j < tour.len()`
fn two_opt_delta(
    costs: &CostMatrix,
    tour: &[PointIndex],
    kind: TourKind,
    i: usize,
    j: usize,
) -> Distance {
    let before = tour[i - 1];
    let (first, last) = (tour[i], tour[j]);
    let next = match (tour.get(j + 1), kind) {
        (Some(&next), _) => Some(next),
        (None, TourKind::Cycle) => Some(tour[0]),
        (None, TourKind::Path) => None,
    };

    let mut delta = costs.get(before, last) - costs.get(before, first);
    if let Some(next) = next {
        delta += costs.get(first, next) - costs.get(last, next);
    }
    delta
}
