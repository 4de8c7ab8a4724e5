//! Event Recorder - Journal and Snapshot Writer
//!
//! Subscribes to the ledger's notification stream, appends every envelope
//! to the repository journal, and snapshots the full ledger on an
//! interval and once more at shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, instrument, warn};

use crate::domain::events::LedgerEnvelope;
use crate::ports::repository::{JournalRecord, LedgerRepository, LedgerSnapshot};
use crate::usecases::ledger_service::LedgerService;

pub struct EventRecorder {
  service: Arc<LedgerService>,
  repo: Arc<dyn LedgerRepository>,
  snapshot_interval: Duration,
  /// Sequence of the last snapshot written.
  last_snapshot: u64,
}

impl EventRecorder {
  pub fn new(
    service: Arc<LedgerService>,
    repo: Arc<dyn LedgerRepository>,
    snapshot_interval: Duration,
  ) -> Self {
    Self {
      service,
      repo,
      snapshot_interval,
      last_snapshot: 0,
    }
  }

  /// Record until shutdown or until the ledger drops its sender.
  ///
  /// `events` must be subscribed before the first mutation that should
  /// reach the journal.
  #[instrument(skip_all)]
  pub async fn run(
    mut self,
    mut events: broadcast::Receiver<LedgerEnvelope>,
    mut shutdown_rx: broadcast::Receiver<()>,
  ) -> Result<()> {
    let mut ticker = tokio::time::interval(self.snapshot_interval);
    ticker.tick().await;

    loop {
      tokio::select! {
        received = events.recv() => match received {
          Ok(envelope) => self.record(&envelope).await,
          Err(RecvError::Lagged(skipped)) => {
            // The snapshot still captures the state the lost events led to.
            warn!(skipped, "Recorder lagged, journal has a gap");
            self.snapshot().await;
          }
          Err(RecvError::Closed) => break,
        },
        _ = ticker.tick() => self.snapshot().await,
        _ = shutdown_rx.recv() => {
          info!("Recorder shutting down");
          break;
        }
      }
    }

    // Drain what was committed before shutdown, then take a final snapshot.
    while let Ok(envelope) = events.try_recv() {
      self.record(&envelope).await;
    }
    self.snapshot().await;
    Ok(())
  }

  async fn record(&self, envelope: &LedgerEnvelope) {
    let record = JournalRecord::new(envelope.clone());
    if let Err(e) = self.repo.append(&record).await {
      error!(
        sequence = envelope.sequence,
        event = envelope.event.name(),
        error = %e,
        "Failed to journal ledger event"
      );
    }
  }

  /// Write a snapshot if the ledger moved since the last one.
  pub async fn snapshot(&mut self) {
    let ledger = self.service.snapshot().await;
    if ledger.sequence() == self.last_snapshot {
      return;
    }
    let snapshot = LedgerSnapshot::of(ledger, Utc::now());
    match self.repo.save_snapshot(&snapshot).await {
      Ok(()) => self.last_snapshot = snapshot.sequence,
      Err(e) => error!(error = %e, "Failed to save ledger snapshot"),
    }
  }
}
