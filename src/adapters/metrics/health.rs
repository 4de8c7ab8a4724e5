//! Health Check Server - Liveness and Readiness Probes
//!
//! `/live` answers while the process runs. `/ready` answers 200 only while
//! the repository can take journal writes, and reports the committed
//! ledger sequence so a probe can tell a stalled ledger from a live one.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::ports::repository::LedgerRepository;
use crate::usecases::ledger_service::LedgerService;

/// What the readiness probe looks at.
#[derive(Clone)]
pub struct HealthState {
    service: Arc<LedgerService>,
    /// `None` when persistence is disabled.
    repo: Option<Arc<dyn LedgerRepository>>,
}

/// Body of `/ready`.
#[derive(Debug, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub sequence: u64,
    pub transfer_failures: u64,
}

impl HealthState {
    pub fn new(service: Arc<LedgerService>, repo: Option<Arc<dyn LedgerRepository>>) -> Self {
        Self { service, repo }
    }

    pub async fn readiness(&self) -> Readiness {
        let ready = match &self.repo {
            Some(repo) => repo.is_healthy().await,
            None => true,
        };
        Readiness {
            ready,
            sequence: self.service.stats().await.sequence,
            transfer_failures: self.service.transfer_failures(),
        }
    }
}

/// Probe server on its own port, separate from the ledger API.
pub struct HealthServer {
    state: Arc<HealthState>,
    port: u16,
}

impl HealthServer {
    pub fn new(state: Arc<HealthState>, port: u16) -> Self {
        Self { state, port }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/live", get(|| async { "OK" }))
            .route("/ready", get(ready))
            .with_state(Arc::clone(&self.state))
    }

    #[instrument(skip(self, shutdown_rx), fields(port = self.port))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", self.port)).await?;
        info!(port = self.port, "Health server started");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;
        Ok(())
    }
}

async fn ready(State(state): State<Arc<HealthState>>) -> (StatusCode, Json<Readiness>) {
    let readiness = state.readiness().await;
    if readiness.ready {
        (StatusCode::OK, Json(readiness))
    } else {
        warn!(sequence = readiness.sequence, "Readiness probe failing: repository unhealthy");
        (StatusCode::SERVICE_UNAVAILABLE, Json(readiness))
    }
}
