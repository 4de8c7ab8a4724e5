//! Event Journal - Append-only JSONL Ledger Events
//!
//! One file per UTC day, `journal/YYYY-MM-DD.jsonl`. Each line is a
//! complete [`JournalRecord`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::ports::repository::JournalRecord;

pub struct EventJournal {
    journal_dir: PathBuf,
}

impl EventJournal {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        let journal_dir = data_dir.join("journal");
        fs::create_dir_all(&journal_dir)
            .await
            .context("Failed to create journal directory")?;
        Ok(Self { journal_dir })
    }

    /// Append a record to the file for the day it was committed.
    #[instrument(skip(self, record), fields(sequence = record.envelope.sequence))]
    pub async fn append(&self, record: &JournalRecord) -> Result<()> {
        let date = record.envelope.at.format("%Y-%m-%d").to_string();
        let path = self.journal_dir.join(format!("{date}.jsonl"));

        let mut json = serde_json::to_string(record)
            .context("Failed to serialize journal record")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open journal file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write journal record")?;

        file.flush().await.context("Failed to flush journal")?;

        Ok(())
    }

    /// Every record across all daily files, ordered by ledger sequence.
    /// Malformed lines are skipped with a warning.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<Vec<JournalRecord>> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(&self.journal_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                let content = fs::read_to_string(&path).await?;
                for line in content.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<JournalRecord>(line) {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            warn!(
                                file = %path.display(),
                                error = %e,
                                "Skipping malformed journal record"
                            );
                        }
                    }
                }
            }
        }

        records.sort_by_key(|r| r.envelope.sequence);
        info!(count = records.len(), "Loaded journal records");
        Ok(records)
    }

    pub async fn load_since(&self, sequence: u64) -> Result<Vec<JournalRecord>> {
        let all = self.load_all().await?;
        Ok(all
            .into_iter()
            .filter(|r| r.envelope.sequence > sequence)
            .collect())
    }

    /// Whether the journal directory is writable.
    pub async fn is_healthy(&self) -> bool {
        let probe = self.journal_dir.join(".health_check");
        let result = fs::write(&probe, b"ok").await;
        let _ = fs::remove_file(&probe).await;
        result.is_ok()
    }
}
