//! File Repository - Concrete Adapter for the LedgerRepository Port
//!
//! Glues `SnapshotStore` and `EventJournal` behind the port so the
//! usecases layer never sees files or JSON.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use super::journal::EventJournal;
use super::state::SnapshotStore;
use crate::ports::repository::{JournalRecord, LedgerRepository, LedgerSnapshot};

pub struct FileRepository {
    snapshots: SnapshotStore,
    journal: EventJournal,
}

impl FileRepository {
    pub fn new(snapshots: SnapshotStore, journal: EventJournal) -> Self {
        Self { snapshots, journal }
    }

    /// Create both stores under `data_dir`.
    pub async fn from_data_dir(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        let snapshots = SnapshotStore::new(dir).await?;
        let journal = EventJournal::new(dir).await?;
        Ok(Self::new(snapshots, journal))
    }
}

#[async_trait]
impl LedgerRepository for FileRepository {
    async fn append(&self, record: &JournalRecord) -> Result<()> {
        self.journal.append(record).await
    }

    async fn load_journal(&self) -> Result<Vec<JournalRecord>> {
        self.journal.load_all().await
    }

    async fn load_journal_since(&self, sequence: u64) -> Result<Vec<JournalRecord>> {
        self.journal.load_since(sequence).await
    }

    async fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        self.snapshots.save(snapshot).await
    }

    async fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        self.snapshots.load().await
    }

    async fn is_healthy(&self) -> bool {
        self.snapshots.is_healthy().await && self.journal.is_healthy().await
    }
}
