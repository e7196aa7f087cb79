//! Append-only record of every discovered slot, one JSON object per line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use slotwatch_core::{SlotCandidate, Target};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::LogWriteError;

/// One line of the result log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    /// Discovery time, local, second precision (`2024-05-30T12:00:00`).
    pub timestamp: String,
    pub location_id: u32,
    pub service_id: u32,
    /// Slot date as `dd.mm.yyyy`.
    pub date: String,
    pub url: String,
}

impl SlotRecord {
    #[must_use]
    pub fn new(discovered_at: NaiveDateTime, target: &Target, slot: &SlotCandidate) -> Self {
        Self {
            timestamp: discovered_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            location_id: target.location_id,
            service_id: target.service_id,
            date: slot.display_date(),
            url: slot.source_url.clone(),
        }
    }
}

/// Durable sink for discovered slots.
#[async_trait]
pub trait ResultLog: Send + Sync {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns [`LogWriteError`] if the record could not be durably written.
    async fn append(&self, record: &SlotRecord) -> Result<(), LogWriteError>;
}

/// [`ResultLog`] backed by a JSON-lines file opened in append mode.
///
/// Each append opens, writes, flushes and closes the file so that a record
/// is on disk before `append` returns. Appends are serialized so lines from
/// concurrent targets never interleave.
#[derive(Debug)]
pub struct JsonLinesLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LogWriteError {
        LogWriteError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl ResultLog for JsonLinesLog {
    async fn append(&self, record: &SlotRecord) -> Result<(), LogWriteError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.sync_data().await.map_err(|e| self.io_error(e))?;

        Ok(())
    }
}
