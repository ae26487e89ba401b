//! Completion signal channel - marker files written by external workers
//!
//! A worker creates `worker<N>_done` in the marker directory when it
//! finishes a unit of work. Presence is the whole signal: there is no
//! in-progress or failed state, no ordering between markers, and no
//! locking. Creation is idempotent, so a misbehaving duplicate worker
//! converges to the same single marker.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::CoterieError;

/// File name of the completion marker for a worker
pub fn marker_name(worker: u32) -> String {
    format!("worker{worker}_done")
}

/// Worker index encoded in a marker file name, if it is one
fn parse_marker(name: &str) -> Option<u32> {
    name.strip_prefix("worker")?
        .strip_suffix("_done")?
        .parse()
        .ok()
}

/// Present/absent marker files in a well-known directory
#[derive(Debug, Clone)]
pub struct CompletionSignals {
    dir: PathBuf,
}

impl CompletionSignals {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The marker directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a worker's marker file
    pub fn marker_path(&self, worker: u32) -> PathBuf {
        self.dir.join(marker_name(worker))
    }

    /// Record that a worker finished its unit of work
    ///
    /// Creating a marker that already exists leaves exactly one marker.
    pub async fn mark_complete(&self, worker: u32) -> Result<(), CoterieError> {
        fs::create_dir_all(&self.dir).await?;
        fs::File::create(self.marker_path(worker)).await?;
        debug!(worker, "completion marker written");
        Ok(())
    }

    /// Polling read: has the worker signalled completion?
    pub async fn is_complete(&self, worker: u32) -> bool {
        fs::metadata(self.marker_path(worker)).await.is_ok()
    }

    /// Worker indices with a marker present, ascending
    pub async fn completed(&self) -> Vec<u32> {
        let mut ids = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(_) => return ids,
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if let Some(id) = entry.file_name().to_str().and_then(parse_marker) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        ids
    }

    /// Delete every marker file; an absent directory or file is success
    pub async fn clear(&self) {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(_) => return,
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if name.to_str().and_then(parse_marker).is_none() {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => debug!(marker = ?name, "stale marker removed"),
                Err(e) => debug!(marker = ?name, error = %e, "marker removal failed; ignoring"),
            }
        }
    }
}
