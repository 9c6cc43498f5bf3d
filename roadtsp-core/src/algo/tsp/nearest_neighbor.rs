use fixedbitset::FixedBitSet;

use super::{Algorithm, Tour, TspSolver};
use crate::{CancelFlag, Error, PointIndex, config::TourKind, routing::CostMatrix};

/// Greedy construction: always move to the closest unvisited point
#[derive(Debug, Clone, Default)]
pub struct NearestNeighborSolver {
    start: PointIndex,
}

impl NearestNeighborSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TspSolver for NearestNeighborSolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::NearestNeighbor
    }

    fn solve(&self, costs: &CostMatrix, kind: TourKind, cancel: &CancelFlag) -> Result<Tour, Error> {
        cancel.check()?;
        Ok(Tour::new(nearest_neighbor_order(costs, self.start), costs, kind))
    }
}

/// Visiting order starting at `start`. Ties go to the lowest point index.
///
/// Returns an empty order for an empty matrix or an out-of-range start.
pub fn nearest_neighbor_order(costs: &CostMatrix, start: PointIndex) -> Vec<PointIndex> {
    let size = costs.size();
    if start >= size {
        return Vec::new();
    }

    let mut visited = FixedBitSet::with_capacity(size);
    let mut order = Vec::with_capacity(size);
    let mut current = start;
    visited.insert(current);
    order.push(current);

    while order.len() < size {
        let mut next: Option<PointIndex> = None;
        for candidate in visited.zeroes() {
            let closer = next.is_none_or(|best| costs.get(current, candidate) < costs.get(current, best));
            if closer {
                next = Some(candidate);
            }
        }
        let Some(next) = next else {
            break;
        };
        visited.insert(next);
        order.push(next);
        current = next;
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs_from_xs(xs: &[f64]) -> CostMatrix {
        let rows: Vec<Vec<f64>> = xs
            .iter()
            .map(|a| xs.iter().map(|b| (a - b).abs()).collect())
            .collect();
        CostMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn greedy_order_on_a_line() {
        let costs = costs_from_xs(&[0.0, 10.0, 1.0, 3.0]);
        assert_eq!(nearest_neighbor_order(&costs, 0), vec![0, 2, 3, 1]);
    }

    #[test]
    fn ties_prefer_lowest_index() {
        // 1 and 2 are both at distance 1 from 0
        let costs = costs_from_xs(&[0.0, 1.0, -1.0]);
        assert_eq!(nearest_neighbor_order(&costs, 0), vec![0, 1, 2]);
    }

    #[test]
    fn cycle_length_includes_return() {
        let costs = costs_from_xs(&[0.0, 10.0, 1.0, 3.0]);
        let tour = NearestNeighborSolver::new()
            .solve(&costs, TourKind::Cycle, &CancelFlag::new())
            .unwrap();
        assert_eq!(tour.length(), 20.0);
        assert!(tour.is_permutation_of(4));
    }

    #[test]
    fn empty_and_single() {
        let empty = CostMatrix::from_rows(&[]).unwrap();
        assert!(nearest_neighbor_order(&empty, 0).is_empty());
        let single = costs_from_xs(&[5.0]);
        assert_eq!(nearest_neighbor_order(&single, 0), vec![0]);
    }
}
