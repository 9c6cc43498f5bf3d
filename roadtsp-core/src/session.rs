//! Active network and point set with explicit replace/reset lifecycle
//!
//! A [`Session`] owns the network as uploaded, the routable copy that point
//! integration splits, the integrated points and a lazily built distance
//! matrix. Every load bumps a generation counter and drops state derived from
//! the previous network, so nothing keeps referring to stale node handles.

use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use geo::Geometry;
use geojson::FeatureCollection;
use hashbrown::HashSet;
use log::{debug, info};
use serde::Serialize;

use crate::{
    CancelFlag, EngineConfig, Error,
    algo::{Evaluation, Evaluator, PointIntegrator, snapping::ensure_unique_ids},
    config::UploadPolicy,
    export::{
        EvaluationReport, IntegrationReport, NetworkSummary, network_to_geojson, network_to_wkt,
        points_to_geojson,
    },
    loading::{build_network, decode_geojson_network, decode_wkt_network, parse_points_csv_str},
    model::{IntegratedPoint, NetworkGraph, PointRecord},
    routing::{DistanceMatrix, ShortestPathEngine},
};

#[derive(Debug)]
struct LoadedNetwork {
    /// Network exactly as uploaded
    base: NetworkGraph,
    /// `base` plus the nodes inserted for the current points
    routable: NetworkGraph,
}

/// Snapshot of what the session currently holds
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub network_loaded: bool,
    pub nodes: usize,
    pub edges: usize,
    pub points: usize,
    pub matrix_current: bool,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct Session {
    config: EngineConfig,
    network: Option<LoadedNetwork>,
    points: Vec<IntegratedPoint>,
    matrix: Mutex<Option<Arc<DistanceMatrix>>>,
    generation: u64,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Incremented by every network load, point upload and reset
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the active network. Integrated points are discarded and must
    /// be uploaded again. On error the previous state is kept.
    pub fn load_network(&mut self, geometries: &[Geometry<f64>]) -> Result<NetworkSummary, Error> {
        let graph = build_network(geometries, &self.config.network)?;
        let summary = NetworkSummary::new(geometries.len(), &graph);

        if !self.points.is_empty() {
            info!(
                "Network replaced, dropping {} integrated points",
                self.points.len()
            );
        }
        self.network = Some(LoadedNetwork {
            routable: graph.clone(),
            base: graph,
        });
        self.points.clear();
        self.invalidate();
        Ok(summary)
    }

    pub fn load_network_geojson(&mut self, text: &str) -> Result<NetworkSummary, Error> {
        let geometries = decode_geojson_network(text)?;
        self.load_network(&geometries)
    }

    pub fn load_network_wkt(&mut self, text: &str) -> Result<NetworkSummary, Error> {
        let geometries = decode_wkt_network(text)?;
        self.load_network(&geometries)
    }

    /// Integrates a batch of points following the configured upload policy
    ///
    /// # Errors
    ///
    /// [`Error::NoNetworkLoaded`] without a network. [`Error::DuplicatePoint`]
    /// for repeated ids, which under [`UploadPolicy::Append`] includes ids
    /// already integrated. The active point set is untouched on error.
    pub fn integrate_points(&mut self, records: &[PointRecord]) -> Result<IntegrationReport, Error> {
        let policy = self.config.points.upload_policy;
        let network = self.network.as_ref().ok_or(Error::NoNetworkLoaded)?;
        ensure_unique_ids(records)?;

        let mut graph = match policy {
            UploadPolicy::Replace => network.base.clone(),
            UploadPolicy::Append => {
                let existing: HashSet<&str> = self.points.iter().map(|p| p.id.as_str()).collect();
                if let Some(record) = records.iter().find(|r| existing.contains(r.id.as_str())) {
                    return Err(Error::DuplicatePoint(record.id.clone()));
                }
                network.routable.clone()
            }
        };

        let outcome = PointIntegrator::new(self.config.points.clone()).integrate(&mut graph, records)?;

        let mut points = match policy {
            UploadPolicy::Replace => Vec::new(),
            UploadPolicy::Append => std::mem::take(&mut self.points),
        };
        points.extend(outcome.points.iter().cloned());
        let report = IntegrationReport::new(&outcome, points.len(), &graph);

        if let Some(network) = self.network.as_mut() {
            network.routable = graph;
        }
        self.points = points;
        self.invalidate();
        Ok(report)
    }

    /// Parses a CSV upload and integrates it; a malformed table leaves the
    /// active point set as it was
    pub fn integrate_points_csv(&mut self, text: &str) -> Result<IntegrationReport, Error> {
        let records = parse_points_csv_str(text)?;
        self.integrate_points(&records)
    }

    /// Routable network, including nodes inserted for the current points
    pub fn network(&self) -> Result<&NetworkGraph, Error> {
        self.network
            .as_ref()
            .map(|network| &network.routable)
            .ok_or(Error::NoNetworkLoaded)
    }

    pub fn points(&self) -> &[IntegratedPoint] {
        &self.points
    }

    pub fn network_geojson(&self) -> Result<FeatureCollection, Error> {
        network_to_geojson(self.network()?)
    }

    pub fn network_wkt(&self) -> Result<String, Error> {
        Ok(network_to_wkt(self.network()?))
    }

    pub fn points_geojson(&self) -> Result<FeatureCollection, Error> {
        points_to_geojson(&self.points)
    }

    pub fn status(&self) -> SessionStatus {
        let network = self.network.as_ref().map(|network| &network.routable);
        SessionStatus {
            network_loaded: network.is_some(),
            nodes: network.map_or(0, NetworkGraph::node_count),
            edges: network.map_or(0, NetworkGraph::edge_count),
            points: self.points.len(),
            matrix_current: self
                .matrix
                .lock()
                .map_or_else(|poisoned| poisoned.into_inner().is_some(), |cached| cached.is_some()),
            generation: self.generation,
        }
    }

    /// Distance matrix of the current points, built on first use and cached
    /// until the network or the point set changes
    pub fn distance_matrix(&self, cancel: &CancelFlag) -> Result<Arc<DistanceMatrix>, Error> {
        let graph = self.network()?;
        if self.points.is_empty() {
            return Err(Error::NoPointsIntegrated);
        }

        let mut cached = self.matrix.lock().map_err(|_| Error::LockPoisoned)?;
        if let Some(matrix) = cached.as_ref() {
            debug!("Reusing distance matrix of generation {}", self.generation);
            return Ok(Arc::clone(matrix));
        }

        let matrix = Arc::new(ShortestPathEngine::new(graph).distance_matrix(&self.points, cancel)?);
        *cached = Some(Arc::clone(&matrix));
        Ok(matrix)
    }

    /// Runs all solvers over the current points
    pub fn evaluate(&self, cancel: &CancelFlag) -> Result<Evaluation, Error> {
        let matrix = self.distance_matrix(cancel)?;
        Evaluator::new(self.network()?, &matrix, &self.config.solver).evaluate(cancel)
    }

    pub fn evaluate_report(&self, cancel: &CancelFlag) -> Result<EvaluationReport, Error> {
        let matrix = self.distance_matrix(cancel)?;
        let evaluation =
            Evaluator::new(self.network()?, &matrix, &self.config.solver).evaluate(cancel)?;
        Ok(EvaluationReport::new(&evaluation, matrix.ids()))
    }

    /// Drops the network and the points
    pub fn reset(&mut self) {
        self.network = None;
        self.points.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        *self.matrix.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        self.matrix.clear_poison();
    }
}

/// Session shared between callers: writers (loads, uploads, reset) are
/// serialized against readers (exports, evaluation)
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<RwLock<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Session>, Error> {
        self.inner.read().map_err(|_| Error::LockPoisoned)
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Session>, Error> {
        self.inner.write().map_err(|_| Error::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LengthMetric, NetworkConfig, PointsConfig};
    use geo::line_string;

    fn planar_config(policy: UploadPolicy) -> EngineConfig {
        EngineConfig {
            network: NetworkConfig {
                node_tolerance: 1e-9,
                metric: LengthMetric::Euclidean,
            },
            points: PointsConfig {
                max_snap_distance: 0.5,
                node_snap_tolerance: 1e-6,
                upload_policy: policy,
            },
            ..EngineConfig::default()
        }
    }

    fn loaded(policy: UploadPolicy) -> Session {
        let mut session = Session::new(planar_config(policy));
        session
            .load_network(&[
                Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0)]),
                Geometry::LineString(line_string![(x: 0.0, y: 1.0), (x: 1.0, y: 1.0)]),
            ])
            .unwrap();
        session
    }

    #[test]
    fn replace_policy_discards_previous_splits() {
        let mut session = loaded(UploadPolicy::Replace);
        session
            .integrate_points(&[PointRecord::new("a", 0.5, 0.1)])
            .unwrap();
        assert_eq!(session.network().unwrap().edge_count(), 3);

        let report = session
            .integrate_points(&[PointRecord::new("b", 1.0, 0.5)])
            .unwrap();
        assert_eq!(report.total_points, 1);
        assert_eq!(report.edges_after_split, 3);
        assert_eq!(session.points()[0].id, "b");
    }

    #[test]
    fn append_policy_keeps_points_and_rejects_known_ids() {
        let mut session = loaded(UploadPolicy::Append);
        session
            .integrate_points(&[PointRecord::new("a", 0.5, 0.1)])
            .unwrap();
        let report = session
            .integrate_points(&[PointRecord::new("b", 1.0, 0.5)])
            .unwrap();
        assert_eq!(report.total_points, 2);
        assert_eq!(report.edges_after_split, 4);

        let err = session
            .integrate_points(&[PointRecord::new("a", 0.0, 0.0)])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatePoint(id) if id == "a"));
        assert_eq!(session.points().len(), 2);
    }

    #[test]
    fn status_waits_for_a_busy_matrix_cache() {
        let mut session = loaded(UploadPolicy::Replace);
        session
            .integrate_points(&[PointRecord::new("a", 0.0, 0.0), PointRecord::new("b", 1.0, 1.0)])
            .unwrap();
        session.distance_matrix(&CancelFlag::new()).unwrap();

        let session = &session;
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        std::thread::scope(|scope| {
            scope.spawn(move || {
                let _cached = session.matrix.lock().unwrap();
                locked_tx.send(()).unwrap();
                std::thread::sleep(std::time::Duration::from_millis(50));
            });
            locked_rx.recv().unwrap();
            assert!(session.status().matrix_current);
        });
    }

    #[test]
    fn malformed_csv_keeps_previous_points() {
        let mut session = loaded(UploadPolicy::Replace);
        session
            .integrate_points_csv("id,lat,lon\na,0.5,0.0\n")
            .unwrap();
        let generation = session.generation();

        let err = session.integrate_points_csv("id,name\na,x\n").unwrap_err();
        assert!(matches!(err, Error::InputFormat(_)));
        assert_eq!(session.points().len(), 1);
        assert_eq!(session.generation(), generation);
    }

    #[test]
    fn reloading_the_network_invalidates_points_and_matrix() {
        let mut session = loaded(UploadPolicy::Replace);
        session
            .integrate_points(&[PointRecord::new("a", 0.0, 0.0), PointRecord::new("b", 1.0, 1.0)])
            .unwrap();
        session.distance_matrix(&CancelFlag::new()).unwrap();
        assert!(session.status().matrix_current);

        session
            .load_network_wkt("LINESTRING (0 0, 2 0)")
            .unwrap();
        let status = session.status();
        assert_eq!(status.points, 0);
        assert!(!status.matrix_current);
        assert!(matches!(
            session.distance_matrix(&CancelFlag::new()),
            Err(Error::NoPointsIntegrated)
        ));
    }

    #[test]
    fn failed_load_keeps_active_network() {
        let mut session = loaded(UploadPolicy::Replace);
        assert!(session.load_network_geojson("not json").is_err());
        assert_eq!(session.network().unwrap().edge_count(), 2);
    }

    #[test]
    fn evaluation_requires_state() {
        let session = Session::new(EngineConfig::default());
        assert!(matches!(
            session.evaluate(&CancelFlag::new()),
            Err(Error::NoNetworkLoaded)
        ));
        let session = loaded(UploadPolicy::Replace);
        assert!(matches!(
            session.evaluate(&CancelFlag::new()),
            Err(Error::NoPointsIntegrated)
        ));
    }

    #[test]
    fn matrix_is_cached_between_evaluations() {
        let mut session = loaded(UploadPolicy::Replace);
        session
            .integrate_points(&[
                PointRecord::new("A", 0.0, 0.0),
                PointRecord::new("B", 1.0, 0.0),
                PointRecord::new("C", 1.0, 1.0),
            ])
            .unwrap();
        let first = session.distance_matrix(&CancelFlag::new()).unwrap();
        let second = session.distance_matrix(&CancelFlag::new()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let report = session.evaluate_report(&CancelFlag::new()).unwrap();
        assert_eq!(report.bruteforce.distance, 4.0);
        assert_eq!(report.bruteforce.tour_ids[0], "A");
    }

    #[test]
    fn shared_session_serializes_writers() {
        let shared = SharedSession::new(loaded(UploadPolicy::Replace));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    let id = format!("p{i}");
                    shared
                        .write()
                        .unwrap()
                        .integrate_points(&[PointRecord::new(id, 0.5, 0.0)])
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let session = shared.read().unwrap();
        assert_eq!(session.points().len(), 1);
        assert_eq!(session.generation(), 5);
    }
}
