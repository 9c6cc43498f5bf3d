// Core types
pub use crate::{CancelFlag, Distance, EngineConfig, Error, NetworkNodeId, PointIndex};
pub use crate::config::{LengthMetric, TourKind, UploadPolicy};

// Network and points
pub use crate::loading::{
    build_network, decode_geojson_network, decode_wkt_network, parse_points_csv,
    parse_points_csv_str,
};
pub use crate::model::{IntegratedPoint, NetworkGraph, PointRecord, SnapKind};

// Routing and solving
pub use crate::algo::{
    Algorithm, BruteForceSolver, Evaluation, Evaluator, NearestNeighborSolver, PointIntegrator,
    SimulatedAnnealingSolver, Tour, TourResult, TspSolver,
};
pub use crate::routing::{CostMatrix, DistanceMatrix, RouteAssembler, ShortestPathEngine};

// Session and responses
pub use crate::export::{EvaluationReport, IntegrationReport, NetworkSummary};
pub use crate::session::{Session, SessionStatus, SharedSession};
