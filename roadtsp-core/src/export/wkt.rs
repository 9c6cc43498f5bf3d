use geo::MultiLineString;
use wkt::ToWkt;

use crate::model::NetworkGraph;

/// The network as one `MULTILINESTRING`, members in edge index order so it
/// lines up with [`super::network_to_geojson`]
pub fn network_to_wkt(graph: &NetworkGraph) -> String {
    let lines = graph.edges().map(|(_, edge)| edge.geometry.clone()).collect();
    MultiLineString::new(lines).to_wkt().to_string()
}
