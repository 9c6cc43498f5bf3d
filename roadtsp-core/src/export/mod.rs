//! Encodings of the session state returned to callers

mod geojson;
mod report;
mod wkt;

pub use geojson::{network_to_geojson, points_to_geojson, route_geometry};
pub use report::{EvaluationReport, IntegrationReport, NetworkSummary, RejectedRow, TourReport};
pub use wkt::network_to_wkt;
