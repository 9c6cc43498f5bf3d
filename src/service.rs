//! Async front of the shared session
//!
//! Session calls can block on the lock or burn CPU for a while, so every one
//! runs on tokio's blocking pool. Dropping the returned future raises the
//! cancellation flag of the work it started.

use std::path::Path;

use geojson::FeatureCollection;
use roadtsp_core::{
    CancelFlag, EngineConfig, Error,
    export::{EvaluationReport, IntegrationReport, NetworkSummary},
    session::{Session, SessionStatus, SharedSession},
};
use tracing::{debug, info_span};

use crate::AppError;

/// Encoding of an uploaded network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFormat {
    GeoJson,
    Wkt,
}

impl NetworkFormat {
    /// `.wkt` and `.txt` files are WKT, anything else is GeoJSON
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("wkt" | "txt") => NetworkFormat::Wkt,
            _ => NetworkFormat::GeoJson,
        }
    }
}

/// Raises the flag unless disarmed, so an abandoned request stops its work
pub(crate) struct CancelOnDrop {
    cancel: Option<CancelFlag>,
}

impl CancelOnDrop {
    pub(crate) fn new(cancel: CancelFlag) -> Self {
        Self {
            cancel: Some(cancel),
        }
    }

    pub(crate) fn disarm(mut self) {
        self.cancel = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            debug!("Request dropped, cancelling its background work");
            cancel.cancel();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionService {
    session: SharedSession,
}

impl SessionService {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            session: SharedSession::new(Session::new(config)),
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub async fn load_network(
        &self,
        text: String,
        format: NetworkFormat,
    ) -> Result<NetworkSummary, AppError> {
        self.blocking("load_network", move |session, _| {
            let mut session = session.write()?;
            match format {
                NetworkFormat::GeoJson => session.load_network_geojson(&text),
                NetworkFormat::Wkt => session.load_network_wkt(&text),
            }
        })
        .await
    }

    pub async fn upload_points(&self, csv: String) -> Result<IntegrationReport, AppError> {
        self.blocking("upload_points", move |session, _| {
            session.write()?.integrate_points_csv(&csv)
        })
        .await
    }

    pub async fn evaluate(&self) -> Result<EvaluationReport, AppError> {
        self.blocking("evaluate", |session, cancel| {
            session.read()?.evaluate_report(cancel)
        })
        .await
    }

    pub async fn network_geojson(&self) -> Result<FeatureCollection, AppError> {
        self.blocking("network_geojson", |session, _| session.read()?.network_geojson())
            .await
    }

    pub async fn network_wkt(&self) -> Result<String, AppError> {
        self.blocking("network_wkt", |session, _| session.read()?.network_wkt())
            .await
    }

    pub async fn points_geojson(&self) -> Result<FeatureCollection, AppError> {
        self.blocking("points_geojson", |session, _| session.read()?.points_geojson())
            .await
    }

    pub async fn status(&self) -> Result<SessionStatus, AppError> {
        self.blocking("status", |session, _| Ok(session.read()?.status()))
            .await
    }

    pub async fn reset(&self) -> Result<(), AppError> {
        self.blocking("reset", |session, _| {
            session.write()?.reset();
            Ok(())
        })
        .await
    }

    async fn blocking<T, F>(&self, operation: &'static str, work: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&SharedSession, &CancelFlag) -> Result<T, Error> + Send + 'static,
    {
        let session = self.session.clone();
        let cancel = CancelFlag::new();
        let guard = CancelOnDrop::new(cancel.clone());

        let result = tokio::task::spawn_blocking(move || {
            let _span = info_span!("session", operation).entered();
            work(&session, &cancel)
        })
        .await;

        guard.disarm();
        Ok(result??)
    }
}
