//! Road-network TSP engine.
//!
//! Builds a routable graph from line geometries, snaps external points onto
//! it, computes all-pairs road distances and compares three TSP strategies
//! (exact, greedy and annealing) over the resulting distance matrix.

pub mod algo;
pub mod cancel;
pub mod config;
pub mod error;
pub mod export;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod session;

pub use cancel::CancelFlag;
pub use config::EngineConfig;
pub use error::Error;

/// Graph node handle inside a [`model::NetworkGraph`]
pub type NetworkNodeId = petgraph::stable_graph::NodeIndex;
/// Graph edge handle inside a [`model::NetworkGraph`]
pub type NetworkEdgeId = petgraph::stable_graph::EdgeIndex;
/// Position of a point inside the integrated point set
pub type PointIndex = usize;
/// Length in the configured metric (meters for haversine)
pub type Distance = f64;
