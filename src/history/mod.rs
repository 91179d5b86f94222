//! JSON-file backed history store.
//!
//! The whole log is a single JSON array in one file. Every operation re-reads
//! the file from disk, and every append rewrites it in full, so edits made to
//! the file by hand are picked up on the next request. Access goes through a
//! `tokio::sync::Mutex` so concurrent appends cannot drop each other's writes.

pub mod record;

pub use record::{
    HistoryQuery, HistoryRecord, MissingFields, Submission, TimeFormat, ValidSubmission,
};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to {action} history file {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history file {} is not a JSON array of records: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[source] serde_json::Error),
}

fn io_err(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> HistoryError {
    let path = path.to_path_buf();
    move |source| HistoryError::Io {
        action,
        path,
        source,
    }
}

// ---------------------------------------------------------------------------
// HistoryStore
// ---------------------------------------------------------------------------

/// Append-only log of [`HistoryRecord`]s stored as a JSON array.
pub struct HistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl HistoryStore {
    /// Open the store at `path`, creating parent directories and an empty
    /// `[]` file if they do not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_err("create directory for", &path))?;
        }

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(io_err("inspect", &path))?;
        if !exists {
            tokio::fs::write(&path, "[]")
                .await
                .map_err(io_err("create", &path))?;
            info!(path = %path.display(), "created empty history file");
        }

        debug!(path = %path.display(), "history store opened");
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Append `record` to the end of the log. Returns the new log length.
    pub async fn append(&self, record: HistoryRecord) -> Result<usize, HistoryError> {
        debug!(cart = %record.cart, status = %record.status, "appending history record");
        self.append_all(std::slice::from_ref(&record)).await
    }

    /// Append `batch` in order with a single rewrite: either every record
    /// lands in the log or none does. Returns the new log length.
    pub async fn append_all(&self, batch: &[HistoryRecord]) -> Result<usize, HistoryError> {
        let _guard = self.lock.lock().await;

        let mut records = self.read_all().await?;
        if batch.is_empty() {
            return Ok(records.len());
        }
        records.extend_from_slice(batch);
        self.write_all(&records).await?;

        Ok(records.len())
    }

    /// Records for `cart` on `date`, in insertion order.
    pub async fn query(&self, cart: &str, date: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        let _guard = self.lock.lock().await;

        let records = self.read_all().await?;
        let total = records.len();
        let matched: Vec<HistoryRecord> = records
            .into_iter()
            .filter(|r| r.matches(cart, date))
            .collect();

        debug!(%cart, %date, total, matched = matched.len(), "history query");
        Ok(matched)
    }

    /// Every record in the log.
    pub async fn all(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    /// Number of records in the log.
    pub async fn len(&self) -> Result<usize, HistoryError> {
        Ok(self.all().await?.len())
    }

    async fn read_all(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            // Removed behind our back: behave as a fresh, empty log.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err("read", &self.path)(e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| HistoryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_all(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(records).map_err(HistoryError::Serialize)?;

        // Write beside the live file, then swap it in.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(io_err("write", &tmp))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(io_err("replace", &self.path))?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
