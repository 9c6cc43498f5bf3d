use thiserror::Error;

use crate::Distance;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed input: {0}")]
    InputFormat(String),
    #[error("Invalid geometry in feature {index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },
    #[error("Duplicate point id: {0}")]
    DuplicatePoint(String),
    #[error("Point {id} is {distance:.3} away from the network (max snap distance: {max})")]
    SnapTolerance {
        id: String,
        distance: Distance,
        max: Distance,
    },
    #[error("No route between points {from} and {to}: they lie in different network components")]
    DisconnectedGraph { from: String, to: String },
    #[error("Brute force supports at most {max} points, got {count}")]
    TooManyPoints { count: usize, max: usize },
    #[error("Invalid tour: {0}")]
    InvalidTour(String),
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("No network loaded")]
    NoNetworkLoaded,
    #[error("No points integrated")]
    NoPointsIntegrated,
    #[error("Computation cancelled")]
    Cancelled,
    #[error("Session lock poisoned")]
    LockPoisoned,
}
