//! All-pairs road distances between integrated points

use hashbrown::HashSet;
use log::{debug, info};
use rayon::prelude::*;

use super::{dijkstra::traced_dijkstra, path::RoadPath};
use crate::{
    CancelFlag, Distance, Error, NetworkNodeId, PointIndex,
    config::TourKind,
    model::{IntegratedPoint, NetworkGraph},
};

/// Dense symmetric cost table the TSP solvers work on
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    size: usize,
    data: Vec<Distance>,
}

impl CostMatrix {
    /// Builds a matrix from explicit rows
    ///
    /// # Errors
    ///
    /// [`Error::InputFormat`] for a non-square, asymmetric or non-zero
    /// diagonal table, [`Error::DisconnectedGraph`] for a non-finite cost.
    pub fn from_rows(rows: &[Vec<Distance>]) -> Result<Self, Error> {
        let size = rows.len();
        let mut data = Vec::with_capacity(size * size);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(Error::InputFormat(format!(
                    "cost matrix row {i} has {} entries, expected {size}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }

        let matrix = Self { size, data };
        for i in 0..size {
            if matrix.get(i, i) != 0.0 {
                return Err(Error::InputFormat(format!(
                    "cost matrix diagonal entry {i} is not zero"
                )));
            }
            for j in (i + 1)..size {
                let (forward, backward) = (matrix.get(i, j), matrix.get(j, i));
                if !forward.is_finite() || !backward.is_finite() {
                    return Err(Error::DisconnectedGraph {
                        from: i.to_string(),
                        to: j.to_string(),
                    });
                }
                if forward != backward {
                    return Err(Error::InputFormat(format!(
                        "cost matrix is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }
        Ok(matrix)
    }

    fn from_upper(size: usize, upper: impl Fn(usize, usize) -> Distance) -> Self {
        let mut data = vec![0.0; size * size];
        for i in 0..size {
            for j in (i + 1)..size {
                let cost = upper(i, j);
                data[i * size + j] = cost;
                data[j * size + i] = cost;
            }
        }
        Self { size, data }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn get(&self, from: PointIndex, to: PointIndex) -> Distance {
        self.data[from * self.size + to]
    }

    /// Total length of visiting `order`, closing the loop for cycles
    ///
    /// A cycle is summed from its smallest point towards the smaller of that
    /// point's two neighbours, whatever rotation or direction `order` lists
    /// it in. Every listing of one cycle therefore yields the same bits.
    pub fn tour_length(&self, order: &[PointIndex], kind: TourKind) -> Distance {
        let len = order.len();
        if kind == TourKind::Path || len < 2 {
            return order.windows(2).map(|pair| self.get(pair[0], pair[1])).sum();
        }

        let start = order
            .iter()
            .enumerate()
            .min_by_key(|&(_, &point)| point)
            .map_or(0, |(position, _)| position);
        let forward = order[(start + 1) % len] <= order[(start + len - 1) % len];
        let at = |step: usize| {
            if forward {
                order[(start + step) % len]
            } else {
                order[(start + len - step) % len]
            }
        };
        (0..len).map(|step| self.get(at(step), at((step + 1) % len))).sum()
    }
}

/// Outcome of routing between two points
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixEntry {
    Reachable(RoadPath),
    /// The points lie in different connected components
    Unreachable,
}

/// Road distances and shortest paths between every pair of integrated
/// points. Symmetric with a zero diagonal by construction; only the upper
/// triangle of paths is stored.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    costs: CostMatrix,
    ids: Vec<String>,
    nodes: Vec<NetworkNodeId>,
    paths: Vec<RoadPath>,
}

impl DistanceMatrix {
    /// Assembles the matrix from upper-triangle rows, where `rows[i][k]` is
    /// the entry between points `i` and `i + 1 + k`
    ///
    /// # Errors
    ///
    /// [`Error::DisconnectedGraph`] naming the first unreachable pair.
    pub fn from_upper_rows(
        points: &[IntegratedPoint],
        rows: Vec<Vec<MatrixEntry>>,
    ) -> Result<Self, Error> {
        let size = points.len();
        let mut paths = Vec::with_capacity(size * size.saturating_sub(1) / 2);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size.saturating_sub(i + 1) {
                return Err(Error::NetworkError(format!(
                    "distance row {i} has {} entries, expected {}",
                    row.len(),
                    size.saturating_sub(i + 1)
                )));
            }
            for (k, entry) in row.into_iter().enumerate() {
                match entry {
                    MatrixEntry::Reachable(path) => paths.push(path),
                    MatrixEntry::Unreachable => {
                        return Err(Error::DisconnectedGraph {
                            from: points[i].id.clone(),
                            to: points[i + 1 + k].id.clone(),
                        });
                    }
                }
            }
        }

        if paths.len() != size * size.saturating_sub(1) / 2 {
            return Err(Error::NetworkError(
                "distance matrix is missing rows".to_string(),
            ));
        }

        let costs = CostMatrix::from_upper(size, |i, j| paths[upper_index(size, i, j)].length);
        Ok(Self {
            costs,
            ids: points.iter().map(|point| point.id.clone()).collect(),
            nodes: points.iter().map(|point| point.node).collect(),
            paths,
        })
    }

    pub fn costs(&self) -> &CostMatrix {
        &self.costs
    }

    pub fn size(&self) -> usize {
        self.costs.size()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn distance(&self, from: PointIndex, to: PointIndex) -> Distance {
        self.costs.get(from, to)
    }

    /// Shortest path from point `from` to point `to`
    pub fn path(&self, from: PointIndex, to: PointIndex) -> Option<RoadPath> {
        let size = self.size();
        if from >= size || to >= size {
            return None;
        }
        match from.cmp(&to) {
            std::cmp::Ordering::Equal => Some(RoadPath::trivial(self.nodes[from])),
            std::cmp::Ordering::Less => self.paths.get(upper_index(size, from, to)).cloned(),
            std::cmp::Ordering::Greater => self
                .paths
                .get(upper_index(size, to, from))
                .map(RoadPath::reversed),
        }
    }
}

/// Position of pair `(i, j)`, `i < j`, in a row-major upper triangle
fn upper_index(size: usize, i: usize, j: usize) -> usize {
    i * size - i * (i + 1) / 2 + (j - i - 1)
}

/// Computes road distances between integrated points
pub struct ShortestPathEngine<'a> {
    graph: &'a NetworkGraph,
}

impl<'a> ShortestPathEngine<'a> {
    pub fn new(graph: &'a NetworkGraph) -> Self {
        Self { graph }
    }

    /// Runs one single-source search per point in parallel and returns the
    /// upper triangle of entries, with unreachable pairs marked explicitly
    pub fn path_table(
        &self,
        points: &[IntegratedPoint],
        cancel: &CancelFlag,
    ) -> Result<Vec<Vec<MatrixEntry>>, Error> {
        (0..points.len())
            .into_par_iter()
            .map(|source| {
                cancel.check()?;
                Ok(self.row(points, source))
            })
            .collect()
    }

    /// Builds the full distance matrix
    ///
    /// # Errors
    ///
    /// [`Error::DisconnectedGraph`] if any pair is unreachable,
    /// [`Error::Cancelled`] if the flag is raised before all searches ran.
    pub fn distance_matrix(
        &self,
        points: &[IntegratedPoint],
        cancel: &CancelFlag,
    ) -> Result<DistanceMatrix, Error> {
        info!("Computing road distances between {} points", points.len());
        let rows = self.path_table(points, cancel)?;
        let matrix = DistanceMatrix::from_upper_rows(points, rows)?;
        debug!("Distance matrix of size {} ready", matrix.size());
        Ok(matrix)
    }

    fn row(&self, points: &[IntegratedPoint], source: PointIndex) -> Vec<MatrixEntry> {
        let later = &points[source + 1..];
        if later.is_empty() {
            return Vec::new();
        }

        let targets: HashSet<NetworkNodeId> = later.iter().map(|point| point.node).collect();
        let tree = traced_dijkstra(self.graph, points[source].node, Some(&targets));

        later
            .iter()
            .map(|target| {
                tree.path_to(target.node)
                    .map_or(MatrixEntry::Unreachable, MatrixEntry::Reachable)
            })
            .collect()
    }
}
