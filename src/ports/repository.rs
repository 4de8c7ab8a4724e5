//! Repository Port - Ledger Persistence Interface
//!
//! Two stores: an append-only journal of every committed ledger event, and
//! a full snapshot of the ledger for fast restarts. JSON throughout, no
//! database dependency.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::LedgerEnvelope;
use crate::domain::ledger::Ledger;

/// Snapshot format version.
pub const SNAPSHOT_VERSION: &str = "1";

/// One journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
  /// Unique record identifier.
  pub id: Uuid,
  /// When the record was written (may trail `envelope.at`).
  pub recorded_at: DateTime<Utc>,
  pub envelope: LedgerEnvelope,
}

impl JournalRecord {
  pub fn new(envelope: LedgerEnvelope) -> Self {
    Self {
      id: Uuid::new_v4(),
      recorded_at: Utc::now(),
      envelope,
    }
  }
}

/// Full ledger state at a given sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
  pub version: String,
  /// Ledger sequence the snapshot was taken at.
  pub sequence: u64,
  pub taken_at: DateTime<Utc>,
  pub ledger: Ledger,
}

impl LedgerSnapshot {
  pub fn of(ledger: Ledger, taken_at: DateTime<Utc>) -> Self {
    Self {
      version: SNAPSHOT_VERSION.to_string(),
      sequence: ledger.sequence(),
      taken_at,
      ledger,
    }
  }
}

/// Trait for ledger persistence providers.
#[async_trait]
pub trait LedgerRepository: Send + Sync + 'static {
  /// Append one event to the journal.
  async fn append(&self, record: &JournalRecord) -> anyhow::Result<()>;

  /// Load every journal record, ordered by ledger sequence.
  async fn load_journal(&self) -> anyhow::Result<Vec<JournalRecord>>;

  /// Journal records with a sequence strictly greater than `sequence`.
  async fn load_journal_since(&self, sequence: u64) -> anyhow::Result<Vec<JournalRecord>>;

  /// Replace the stored snapshot.
  async fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> anyhow::Result<()>;

  /// The most recent snapshot, or `None` on first start.
  async fn load_snapshot(&self) -> anyhow::Result<Option<LedgerSnapshot>>;

  /// Whether the backing storage is usable.
  async fn is_healthy(&self) -> bool;
}
