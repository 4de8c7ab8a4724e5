//! Snapshot Store - Atomic JSON Ledger Persistence
//!
//! Writes the full ledger to `state.json` through a temporary file and a
//! rename, so the file on disk is always a complete snapshot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, instrument};

use crate::ports::repository::{LedgerSnapshot, SNAPSHOT_VERSION};

pub struct SnapshotStore {
    /// Path to state.json.
    state_path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl SnapshotStore {
    /// Create a store in `data_dir`, creating the directory if needed.
    pub async fn new(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .await
            .context("Failed to create data directory")?;

        Ok(Self {
            state_path: data_dir.join("state.json"),
            tmp_path: data_dir.join("state.json.tmp"),
        })
    }

    /// Save a snapshot atomically (tmp → rename).
    #[instrument(skip(self, snapshot), fields(sequence = snapshot.sequence))]
    pub async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)
            .context("Failed to serialize snapshot")?;

        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp snapshot file")?;

        fs::rename(&self.tmp_path, &self.state_path)
            .await
            .context("Failed to rename snapshot file")?;

        info!(
            path = %self.state_path.display(),
            sequence = snapshot.sequence,
            "Ledger snapshot saved"
        );

        Ok(())
    }

    /// Load the stored snapshot; `None` on first startup.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Option<LedgerSnapshot>> {
        if !fs::try_exists(&self.state_path).await.unwrap_or(false) {
            info!("No snapshot found, starting fresh");
            return Ok(None);
        }

        let json = fs::read_to_string(&self.state_path)
            .await
            .context("Failed to read snapshot file")?;

        let snapshot: LedgerSnapshot =
            serde_json::from_str(&json).context("Failed to parse snapshot JSON")?;

        anyhow::ensure!(
            snapshot.version == SNAPSHOT_VERSION,
            "Unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
            snapshot.version
        );

        info!(
            sequence = snapshot.sequence,
            markets = snapshot.ledger.stats().markets,
            "Ledger snapshot loaded"
        );

        Ok(Some(snapshot))
    }

    /// Healthy when the snapshot, if any, is readable.
    pub async fn is_healthy(&self) -> bool {
        if !fs::try_exists(&self.state_path).await.unwrap_or(false) {
            return true;
        }
        fs::metadata(&self.state_path).await.is_ok()
    }
}
