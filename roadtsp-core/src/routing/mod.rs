//! Road distances between integrated points and the geometry of tours
//! travelling along them

pub mod assembler;
pub mod dijkstra;
pub mod matrix;
pub mod path;

pub use assembler::RouteAssembler;
pub use dijkstra::{ShortestPathTree, traced_dijkstra};
pub use matrix::{CostMatrix, DistanceMatrix, MatrixEntry, ShortestPathEngine};
pub use path::RoadPath;
