use geo::{Coord, LineString};

use super::{matrix::DistanceMatrix, path::RoadPath};
use crate::{Error, PointIndex, config::TourKind, model::NetworkGraph};

/// Stitches the shortest paths between consecutive tour points into the
/// road geometry actually travelled
pub struct RouteAssembler<'a> {
    graph: &'a NetworkGraph,
    matrix: &'a DistanceMatrix,
}

impl<'a> RouteAssembler<'a> {
    pub fn new(graph: &'a NetworkGraph, matrix: &'a DistanceMatrix) -> Self {
        Self { graph, matrix }
    }

    /// Geometry of `order`, including the leg back to the start for cycles.
    ///
    /// Junction vertices shared by consecutive pieces appear once. A tour
    /// whose points all sit on one node has nowhere to go and yields a
    /// degenerate line repeating that node, so the result is always a valid
    /// two-vertex line string.
    pub fn assemble(&self, order: &[PointIndex], kind: TourKind) -> Result<LineString<f64>, Error> {
        let mut legs: Vec<(PointIndex, PointIndex)> =
            order.windows(2).map(|pair| (pair[0], pair[1])).collect();
        if kind == TourKind::Cycle
            && order.len() > 1
            && let (Some(&first), Some(&last)) = (order.first(), order.last())
        {
            legs.push((last, first));
        }

        let mut coords: Vec<Coord<f64>> = Vec::new();
        if let Some(&start) = order.first() {
            let path = self.leg(start, start)?;
            self.append_path(&mut coords, &path)?;
        }
        for (from, to) in legs {
            let path = self.leg(from, to)?;
            self.append_path(&mut coords, &path)?;
        }

        if let [only] = coords[..] {
            coords.push(only);
        }
        Ok(LineString::new(coords))
    }

    fn leg(&self, from: PointIndex, to: PointIndex) -> Result<RoadPath, Error> {
        self.matrix.path(from, to).ok_or_else(|| {
            Error::InvalidTour(format!(
                "point index {} is outside the distance matrix",
                from.max(to)
            ))
        })
    }

    fn append_path(&self, coords: &mut Vec<Coord<f64>>, path: &RoadPath) -> Result<(), Error> {
        let Some(&start) = path.nodes.first() else {
            return Ok(());
        };
        let node = self
            .graph
            .node(start)
            .ok_or_else(|| Error::NetworkError(format!("node {} is missing", start.index())))?;
        push_merged(coords, node.geometry.into());

        for (step, &edge_id) in path.edges.iter().enumerate() {
            let edge = self
                .graph
                .edge(edge_id)
                .ok_or_else(|| Error::NetworkError(format!("edge {} is missing", edge_id.index())))?;
            let (source, _) = self.graph.edge_endpoints(edge_id).ok_or_else(|| {
                Error::NetworkError(format!("edge {} has no endpoints", edge_id.index()))
            })?;
            let forward = source == path.nodes[step];
            for coord in edge.oriented_coords(forward) {
                push_merged(coords, coord);
            }
        }
        Ok(())
    }
}

fn push_merged(coords: &mut Vec<Coord<f64>>, coord: Coord<f64>) {
    if coords.last() != Some(&coord) {
        coords.push(coord);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CancelFlag,
        config::LengthMetric,
        model::{IntegratedPoint, SnapKind},
        routing::ShortestPathEngine,
    };
    use geo::{Point, line_string};

    fn setup() -> (NetworkGraph, DistanceMatrix) {
        let mut graph = NetworkGraph::new(LengthMetric::Euclidean);
        let a = graph.add_node(Point::new(0.0, 0.0));
        let b = graph.add_node(Point::new(0.0, 1.0));
        let c = graph.add_node(Point::new(1.0, 1.0));
        // stored b -> a to exercise reversed traversal
        graph.add_edge(b, a, line_string![(x: 0.0, y: 1.0), (x: 0.0, y: 0.5), (x: 0.0, y: 0.0)]);
        graph.add_edge(b, c, line_string![(x: 0.0, y: 1.0), (x: 1.0, y: 1.0)]);

        let points: Vec<_> = [("A", a), ("B", b), ("C", c)]
            .into_iter()
            .map(|(id, node)| {
                let geometry = graph.node(node).unwrap().geometry;
                IntegratedPoint {
                    id: id.to_string(),
                    original: geometry,
                    snapped: geometry,
                    node,
                    snap: SnapKind::ExistingNode,
                    distance_to_edge: 0.0,
                }
            })
            .collect();
        let matrix = ShortestPathEngine::new(&graph)
            .distance_matrix(&points, &CancelFlag::new())
            .unwrap();
        (graph, matrix)
    }

    #[test]
    fn closed_tour_follows_road_geometry() {
        let (graph, matrix) = setup();
        let route = RouteAssembler::new(&graph, &matrix)
            .assemble(&[0, 1, 2], TourKind::Cycle)
            .unwrap();

        let expected: Vec<(f64, f64)> = vec![
            (0.0, 0.0),
            (0.0, 0.5),
            (0.0, 1.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.5),
            (0.0, 0.0),
        ];
        let actual: Vec<(f64, f64)> = route.0.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn no_zero_length_segments() {
        let (graph, matrix) = setup();
        let route = RouteAssembler::new(&graph, &matrix)
            .assemble(&[2, 0, 1], TourKind::Cycle)
            .unwrap();
        assert!(route.0.windows(2).all(|pair| pair[0] != pair[1]));
        assert_eq!(route.0.first(), route.0.last());
    }

    #[test]
    fn open_path_omits_closing_leg() {
        let (graph, matrix) = setup();
        let route = RouteAssembler::new(&graph, &matrix)
            .assemble(&[0, 1], TourKind::Path)
            .unwrap();
        assert_eq!(route.0.len(), 3);
    }

    #[test]
    fn single_point_tour_is_a_degenerate_line() {
        let (graph, matrix) = setup();
        let route = RouteAssembler::new(&graph, &matrix)
            .assemble(&[1], TourKind::Cycle)
            .unwrap();
        assert_eq!(route.0, vec![Coord { x: 0.0, y: 1.0 }; 2]);
    }

    #[test]
    fn rejects_unknown_points() {
        let (graph, matrix) = setup();
        let result = RouteAssembler::new(&graph, &matrix).assemble(&[0, 7], TourKind::Cycle);
        assert!(matches!(result, Err(Error::InvalidTour(_))));
    }
}
