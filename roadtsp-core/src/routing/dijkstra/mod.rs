mod state;
pub mod traced_dijkstra;

pub use traced_dijkstra::{ShortestPathTree, traced_dijkstra};
