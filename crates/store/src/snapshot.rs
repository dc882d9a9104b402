// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable scheduler state: the snapshot payload and the opaque sink it
//! is written to.

use herd_core::{JobConfiguration, ScheduledTask};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("snapshot decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Everything the scheduler needs to resume: the id counter, every stored
/// task, every registered cron configuration, and the framework id.
///
/// Volatile task fields (consumption, heartbeats) are excluded by their
/// serde attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub task_counter: u64,
    pub tasks: Vec<ScheduledTask>,
    pub cron_jobs: Vec<JobConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_id: Option<String>,
}

impl Snapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        serde_json::to_vec(self).map_err(SnapshotError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        serde_json::from_slice(bytes).map_err(SnapshotError::Decode)
    }
}

/// Opaque durable storage for snapshot bytes.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, bytes: &[u8]) -> io::Result<()>;
    /// `None` when no snapshot has ever been saved.
    fn load(&self) -> io::Result<Option<Vec<u8>>>;
}

/// File-backed snapshot sink. Writes to a sibling temp file and renames,
/// so a crash mid-write leaves the last good snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, bytes: &[u8]) -> io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)
    }

    fn load(&self) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
