use geo::{Coord, Geometry, LineString};
use log::{info, warn};

use crate::{Error, config::NetworkConfig, model::NetworkGraph};

/// Builds a routable network from line geometries
///
/// Endpoints closer than `config.node_tolerance` collapse into one node and
/// every line becomes exactly one edge keeping its full vertex sequence.
///
/// # Errors
///
/// Returns [`Error::InputFormat`] for an empty collection and
/// [`Error::InvalidGeometry`] for the first non-line or degenerate geometry.
pub fn build_network(
    geometries: &[Geometry<f64>],
    config: &NetworkConfig,
) -> Result<NetworkGraph, Error> {
    if geometries.is_empty() {
        return Err(Error::InputFormat(
            "network contains no line features".to_string(),
        ));
    }

    let lines = geometries
        .iter()
        .enumerate()
        .map(|(index, geometry)| validate_line(index, geometry))
        .collect::<Result<Vec<_>, _>>()?;

    let mut graph = NetworkGraph::new(config.metric);
    for line in lines {
        let mut coords = line.0;
        let (Some(&first), Some(&last)) = (coords.first(), coords.last()) else {
            continue;
        };

        let source = graph.find_or_insert_node(first.into(), config.node_tolerance);
        let target = graph.find_or_insert_node(last.into(), config.node_tolerance);

        // Endpoints take the shared node position so junctions line up exactly
        if let Some(node) = graph.node(source) {
            coords[0] = node.geometry.into();
        }
        if let (Some(node), Some(end)) = (graph.node(target), coords.last_mut()) {
            *end = node.geometry.into();
        }

        graph.add_edge(source, target, LineString::new(coords));
    }

    info!(
        "Built network with {} nodes and {} edges ({:.1} total length)",
        graph.node_count(),
        graph.edge_count(),
        graph.total_length()
    );

    let components = graph.component_count();
    if components > 1 {
        warn!(
            "Network has {components} disconnected components. Points snapped to different \
            components cannot be routed between each other."
        );
    }

    Ok(graph)
}

fn validate_line(index: usize, geometry: &Geometry<f64>) -> Result<LineString<f64>, Error> {
    let invalid = |reason: String| Error::InvalidGeometry { index, reason };

    let line = match geometry {
        Geometry::LineString(line) => line.clone(),
        Geometry::Line(line) => LineString::new(vec![line.start, line.end]),
        other => return Err(invalid(format!("expected a line, got {}", kind_name(other)))),
    };

    if line.0.len() < 2 {
        return Err(invalid(format!(
            "line has {} vertices, at least 2 are required",
            line.0.len()
        )));
    }

    if let Some(bad) = line.0.iter().find(|coord| !is_valid_lon_lat(coord)) {
        return Err(invalid(format!(
            "coordinate ({}, {}) is not a valid longitude/latitude",
            bad.x, bad.y
        )));
    }

    if line.0.windows(2).all(|pair| pair[0] == pair[1]) {
        return Err(invalid("line has zero length".to_string()));
    }

    Ok(line)
}

pub(crate) fn is_valid_lon_lat(coord: &Coord<f64>) -> bool {
    coord.x.is_finite()
        && coord.y.is_finite()
        && (-180.0..=180.0).contains(&coord.x)
        && (-90.0..=90.0).contains(&coord.y)
}

fn kind_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LengthMetric;
    use geo::{Point, line_string};

    fn planar() -> NetworkConfig {
        NetworkConfig {
            node_tolerance: 1e-6,
            metric: LengthMetric::Euclidean,
        }
    }

    #[test]
    fn shared_endpoints_become_one_node() {
        let geometries = vec![
            Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0)]),
            Geometry::LineString(line_string![(x: 0.0, y: 1.0 + 1e-9), (x: 1.0, y: 1.0)]),
        ];
        let graph = build_network(&geometries, &planar()).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!((graph.total_length() - 2.0).abs() < 1e-6);
        assert_eq!(graph.component_count(), 1);
    }

    #[test]
    fn keeps_intermediate_vertices() {
        let geometries = vec![Geometry::LineString(
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
        )];
        let graph = build_network(&geometries, &planar()).unwrap();
        let (_, edge) = graph.edges().next().unwrap();
        assert_eq!(edge.geometry.0.len(), 3);
        assert!((edge.length - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_line_geometry() {
        let geometries = vec![
            Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0)]),
            Geometry::Point(Point::new(0.0, 0.0)),
        ];
        let err = build_network(&geometries, &planar()).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { index: 1, .. }));
    }

    #[test]
    fn rejects_degenerate_lines() {
        let single = vec![Geometry::LineString(LineString::new(vec![Coord { x: 0.0, y: 0.0 }]))];
        assert!(matches!(
            build_network(&single, &planar()),
            Err(Error::InvalidGeometry { index: 0, .. })
        ));

        let nan = vec![Geometry::LineString(line_string![(x: 0.0, y: f64::NAN), (x: 0.0, y: 1.0)])];
        assert!(matches!(
            build_network(&nan, &planar()),
            Err(Error::InvalidGeometry { .. })
        ));

        let out_of_range =
            vec![Geometry::LineString(line_string![(x: 0.0, y: 95.0), (x: 0.0, y: 1.0)])];
        assert!(matches!(
            build_network(&out_of_range, &planar()),
            Err(Error::InvalidGeometry { .. })
        ));

        let zero = vec![Geometry::LineString(line_string![(x: 1.0, y: 1.0), (x: 1.0, y: 1.0)])];
        assert!(matches!(
            build_network(&zero, &planar()),
            Err(Error::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn rejects_empty_collection() {
        assert!(matches!(
            build_network(&[], &planar()),
            Err(Error::InputFormat(_))
        ));
    }
}
