use geo::LineString;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use crate::{
    Error,
    model::{IntegratedPoint, NetworkGraph},
};

/// One `LineString` feature per edge, in edge index order
pub fn network_to_geojson(graph: &NetworkGraph) -> Result<FeatureCollection, Error> {
    let features = graph
        .edges()
        .map(|(id, edge)| {
            let (source, target) = graph
                .edge_endpoints(id)
                .ok_or_else(|| Error::NetworkError(format!("edge {} has no endpoints", id.index())))?;
            let value = json!({
                "type": "Feature",
                "geometry": route_geometry(&edge.geometry),
                "properties": {
                    "edge": id.index(),
                    "source": source.index(),
                    "target": target.index(),
                    "length": edge.length,
                }
            });
            serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJson(e.to_string()))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

/// Integrated points at their snapped position
pub fn points_to_geojson(points: &[IntegratedPoint]) -> Result<FeatureCollection, Error> {
    let features = points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let value = json!({
                "type": "Feature",
                "geometry": Geometry::new(GeoJsonValue::from(&point.snapped)),
                "properties": {
                    "id": point.id,
                    "index": index,
                    "distance_to_edge": point.distance_to_edge,
                    "snap": point.snap.as_str(),
                    "original": [point.original.x(), point.original.y()],
                }
            });
            serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJson(e.to_string()))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

pub fn route_geometry(route: &LineString<f64>) -> Geometry {
    Geometry::new(GeoJsonValue::from(route))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{LengthMetric, NetworkConfig},
        loading::{build_network, decode_geojson_network},
        model::SnapKind,
    };
    use geo::{Point, line_string};

    fn network() -> NetworkGraph {
        let geometries = vec![
            geo::Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0)]),
            geo::Geometry::LineString(
                line_string![(x: 0.0, y: 1.0), (x: 0.5, y: 1.5), (x: 1.0, y: 1.0)],
            ),
        ];
        build_network(
            &geometries,
            &NetworkConfig {
                node_tolerance: 1e-9,
                metric: LengthMetric::Haversine,
            },
        )
        .unwrap()
    }

    #[test]
    fn network_round_trips_through_geojson() {
        let graph = network();
        let text = serde_json::to_string(&network_to_geojson(&graph).unwrap()).unwrap();
        let reloaded = build_network(
            &decode_geojson_network(&text).unwrap(),
            &NetworkConfig::default(),
        )
        .unwrap();

        assert_eq!(reloaded.node_count(), graph.node_count());
        assert_eq!(reloaded.edge_count(), graph.edge_count());
        assert!((reloaded.total_length() - graph.total_length()).abs() < 1e-6);
    }

    #[test]
    fn points_use_snapped_position() {
        let graph = network();
        let node = graph.nearest_node(Point::new(0.0, 1.0)).unwrap();
        let point = IntegratedPoint {
            id: "p1".to_string(),
            original: Point::new(0.001, 1.0),
            snapped: Point::new(0.0, 1.0),
            node,
            snap: SnapKind::ExistingNode,
            distance_to_edge: 111.2,
        };
        let collection = points_to_geojson(&[point]).unwrap();
        let value = serde_json::to_value(&collection).unwrap();
        let feature = &value["features"][0];

        assert_eq!(feature["geometry"]["type"], json!("Point"));
        assert_eq!(feature["geometry"]["coordinates"], json!([0.0, 1.0]));
        assert_eq!(feature["properties"]["id"], json!("p1"));
        assert_eq!(feature["properties"]["snap"], json!("existing_node"));
        assert_eq!(feature["properties"]["original"], json!([0.001, 1.0]));
    }
}
