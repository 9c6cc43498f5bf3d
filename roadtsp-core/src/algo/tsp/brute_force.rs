//! Exact solver by exhaustive enumeration.
//!
//! Point 0 is fixed as the start, which removes rotations of the same cycle.
//! For cycles, a permutation and its mirror describe the same tour, so only
//! permutations whose first element is smaller than their last are measured.
//! Cost is still factorial, hence the point ceiling.

use itertools::Itertools;
use log::debug;

use super::{Algorithm, Tour, TspSolver};
use crate::{CancelFlag, Distance, Error, config::TourKind, routing::CostMatrix};

/// Permutations evaluated between two cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 4096;

#[derive(Debug, Clone)]
pub struct BruteForceSolver {
    max_points: usize,
    skip_mirrored: bool,
}

impl BruteForceSolver {
    pub fn new(max_points: usize) -> Self {
        Self {
            max_points,
            skip_mirrored: true,
        }
    }

    /// Whether mirrored cycles are skipped; disabling it doubles the work
    pub fn with_skip_mirrored(mut self, skip_mirrored: bool) -> Self {
        self.skip_mirrored = skip_mirrored;
        self
    }
}

impl TspSolver for BruteForceSolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::BruteForce
    }

    fn solve(&self, costs: &CostMatrix, kind: TourKind, cancel: &CancelFlag) -> Result<Tour, Error> {
        let size = costs.size();
        if size > self.max_points {
            return Err(Error::TooManyPoints {
                count: size,
                max: self.max_points,
            });
        }
        if size <= 2 {
            return Ok(Tour::new((0..size).collect(), costs, kind));
        }

        let skip_mirrored = self.skip_mirrored && kind == TourKind::Cycle;
        let mut best: Option<(Distance, Vec<usize>)> = None;
        let mut evaluated = 0usize;

        for (count, rest) in (1..size).permutations(size - 1).enumerate() {
            if count % CANCEL_CHECK_INTERVAL == 0 {
                cancel.check()?;
            }
            if skip_mirrored && rest.first() > rest.last() {
                continue;
            }
            evaluated += 1;

            let length = candidate_length(costs, &rest, kind);
            if best.as_ref().is_none_or(|(best_length, _)| length < *best_length) {
                best = Some((length, rest));
            }
        }

        debug!("Brute force evaluated {evaluated} candidate tours over {size} points");

        let order = best
            .map(|(_, rest)| std::iter::once(0).chain(rest).collect())
            .unwrap_or_else(|| (0..size).collect());
        Ok(Tour::new(order, costs, kind))
    }
}

/// Length of `0, rest..`, bit-identical to [`CostMatrix::tour_length`]
/// without building the full order
fn candidate_length(costs: &CostMatrix, rest: &[usize], kind: TourKind) -> Distance {
    match kind {
        TourKind::Cycle if rest.first() > rest.last() => {
            summed_from_start(costs, rest.iter().rev(), true)
        }
        TourKind::Cycle => summed_from_start(costs, rest.iter(), true),
        TourKind::Path => summed_from_start(costs, rest.iter(), false),
    }
}

fn summed_from_start<'a>(
    costs: &CostMatrix,
    steps: impl Iterator<Item = &'a usize>,
    close: bool,
) -> Distance {
    let mut length = 0.0;
    let mut previous = 0;
    for &next in steps {
        length += costs.get(previous, next);
        previous = next;
    }
    if close {
        length += costs.get(previous, 0);
    }
    length
}
