//! Serializable responses for the load, upload and evaluate operations

use geojson::Geometry;
use serde::Serialize;

use super::route_geometry;
use crate::{
    Distance,
    algo::{Evaluation, IntegrationOutcome, TourResult},
    model::NetworkGraph,
};

#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub ok: bool,
    /// Line features accepted from the upload
    pub lines: usize,
    pub nodes: usize,
    pub edges: usize,
    pub total_length: Distance,
}

impl NetworkSummary {
    pub fn new(lines: usize, graph: &NetworkGraph) -> Self {
        Self {
            ok: true,
            lines,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            total_length: graph.total_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrationReport {
    pub ok: bool,
    pub points_integrated: usize,
    pub total_rows: usize,
    /// Size of the active point set after the upload
    pub total_points: usize,
    pub edges_after_split: usize,
    pub rejected: Vec<RejectedRow>,
}

impl IntegrationReport {
    pub fn new(outcome: &IntegrationOutcome, total_points: usize, graph: &NetworkGraph) -> Self {
        Self {
            ok: true,
            points_integrated: outcome.points.len(),
            total_rows: outcome.total,
            total_points,
            edges_after_split: graph.edge_count(),
            rejected: outcome
                .rejected
                .iter()
                .map(|rejected| RejectedRow {
                    id: rejected.id.clone(),
                    reason: rejected.error.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TourReport {
    pub tour: Vec<usize>,
    pub tour_ids: Vec<String>,
    pub distance: Distance,
    pub elapsed_seconds: f64,
    pub route: Geometry,
}

impl TourReport {
    fn new(result: &TourResult, ids: &[String]) -> Self {
        let tour = result.tour().order().to_vec();
        let tour_ids = tour
            .iter()
            .filter_map(|&index| ids.get(index).cloned())
            .collect();
        Self {
            tour,
            tour_ids,
            distance: result.distance(),
            elapsed_seconds: result.elapsed().as_secs_f64(),
            route: route_geometry(result.route()),
        }
    }
}

/// Evaluation keyed by algorithm name
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub bruteforce: TourReport,
    pub nearest_neighbor: TourReport,
    pub simulated_annealing: TourReport,
}

impl EvaluationReport {
    /// `ids` maps point indices back to the uploaded ids
    pub fn new(evaluation: &Evaluation, ids: &[String]) -> Self {
        Self {
            bruteforce: TourReport::new(&evaluation.bruteforce, ids),
            nearest_neighbor: TourReport::new(&evaluation.nearest_neighbor, ids),
            simulated_annealing: TourReport::new(&evaluation.simulated_annealing, ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algo::{Algorithm, RejectedPoint, Tour},
        config::TourKind,
        routing::CostMatrix,
        Error,
    };
    use geo::line_string;
    use std::time::Duration;

    #[test]
    fn integration_report_lists_rejections() {
        let graph = NetworkGraph::new(crate::config::LengthMetric::Euclidean);
        let outcome = IntegrationOutcome {
            points: Vec::new(),
            rejected: vec![RejectedPoint {
                id: "far".to_string(),
                error: Error::SnapTolerance {
                    id: "far".to_string(),
                    distance: 900.0,
                    max: 500.0,
                },
            }],
            total: 1,
        };
        let value = serde_json::to_value(IntegrationReport::new(&outcome, 0, &graph)).unwrap();
        assert_eq!(value["points_integrated"], 0);
        assert_eq!(value["total_rows"], 1);
        assert_eq!(value["rejected"][0]["id"], "far");
        assert!(
            value["rejected"][0]["reason"]
                .as_str()
                .unwrap()
                .contains("max snap distance")
        );
    }

    #[test]
    fn evaluation_report_is_keyed_by_algorithm() {
        let costs = CostMatrix::from_rows(&[vec![0.0, 2.0], vec![2.0, 0.0]]).unwrap();
        let result = |algorithm| {
            TourResult::new(
                algorithm,
                Tour::new(vec![0, 1], &costs, TourKind::Cycle),
                Duration::from_millis(1500),
                line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0)],
            )
        };
        let evaluation = Evaluation {
            bruteforce: result(Algorithm::BruteForce),
            nearest_neighbor: result(Algorithm::NearestNeighbor),
            simulated_annealing: result(Algorithm::SimulatedAnnealing),
        };
        let ids = vec!["a".to_string(), "b".to_string()];
        let value = serde_json::to_value(EvaluationReport::new(&evaluation, &ids)).unwrap();

        for key in ["bruteforce", "nearest_neighbor", "simulated_annealing"] {
            assert_eq!(value[key]["tour"], serde_json::json!([0, 1]));
            assert_eq!(value[key]["tour_ids"], serde_json::json!(["a", "b"]));
            assert_eq!(value[key]["distance"], 4.0);
            assert_eq!(value[key]["elapsed_seconds"], 1.5);
            assert_eq!(value[key]["route"]["type"], "LineString");
        }
    }
}
