//! This module is responsible for decoding uploaded data (GeoJSON/WKT
//! networks, CSV point tables) and building a routable network graph.

mod builder;
pub mod network;
pub mod points;

pub use builder::build_network;
pub use network::{decode_geojson_network, decode_wkt_network};
pub use points::{parse_points_csv, parse_points_csv_str};
