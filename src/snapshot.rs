//! Persists aggregated postings as dated JSON snapshots.
//!
//! # Layout
//!
//! ```text
//! {root}/
//! └── remoteok/
//!     ├── 2025-03-12_remoteok_jobs_09h.json   (hourly partitions)
//!     └── 2025-03-12_remoteok_jobs.json       (daily partitions)
//! ```
//!
//! Each file is one pretty-printed JSON array (4-space indent, non-ASCII
//! written literally). Writing a partition that already exists replaces it.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{Local, NaiveDate, Timelike};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use thiserror::Error;
use tokio::fs;

use crate::model::{JobPosting, Source};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Date (and optionally hour) a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionKey {
    pub date: NaiveDate,
    pub hour: Option<u32>,
}

impl PartitionKey {
    /// The partition for the current local time.
    pub fn now(hourly: bool) -> Self {
        let now = Local::now();
        Self {
            date: now.date_naive(),
            hour: hourly.then(|| now.hour()),
        }
    }

    /// File name of `source`'s snapshot in this partition.
    pub fn file_name(&self, source: Source) -> String {
        let date = self.date.format("%Y-%m-%d");
        match self.hour {
            Some(hour) => format!("{date}_{source}_jobs_{hour:02}h.json"),
            None => format!("{date}_{source}_jobs.json"),
        }
    }
}

/// Destination for aggregated postings.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Writes the whole sequence for one source and partition, returning
    /// where it was stored.
    async fn write(
        &self,
        source: Source,
        partition: &PartitionKey,
        postings: &[JobPosting],
    ) -> Result<PathBuf, SnapshotError>;
}

/// Writes snapshots under a root directory, one subdirectory per source.
#[derive(Debug, Clone)]
pub struct FileSnapshotSink {
    root: PathBuf,
}

impl FileSnapshotSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, source: Source, partition: &PartitionKey) -> PathBuf {
        self.root
            .join(source.as_str())
            .join(partition.file_name(source))
    }
}

#[async_trait]
impl SnapshotSink for FileSnapshotSink {
    async fn write(
        &self,
        source: Source,
        partition: &PartitionKey,
        postings: &[JobPosting],
    ) -> Result<PathBuf, SnapshotError> {
        let path = self.path_for(source, partition);
        let json = render_json(postings)?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await.map_err(|e| io_error(dir, e))?;
        }
        write_atomic(&path, &json).await?;

        tracing::info!(source = %source, path = %path.display(), count = postings.len(), "Wrote snapshot");
        Ok(path)
    }
}

/// Serializes postings as a JSON array indented by four spaces.
///
/// `serde_json` never escapes non-ASCII characters, so `Zürich` stays
/// `Zürich` in the output.
pub fn render_json(postings: &[JobPosting]) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    postings.serialize(&mut serializer)?;
    Ok(out)
}

/// Writes to a uniquely named temp file, then renames it over `path`, so a
/// reader never sees a half-written snapshot.
async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), SnapshotError> {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", suffix));

    if let Err(e) = fs::write(&temp_path, content).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(io_error(&temp_path, e));
    }
    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(io_error(path, e));
    }
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> SnapshotError {
    SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    }
}
