// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler error types.

use herd_core::{JobKey, TaskDescriptionError};
use herd_store::{SnapshotError, StoreError};
use thiserror::Error;

/// Semantic rejection of a scheduler operation.
///
/// Routine distributed noise (invalid transitions, unknown restart ids,
/// cross-slave reports) is logged and ignored instead of surfacing here.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("job {0} already exists")]
    DuplicateJob(JobKey),
    #[error("no job found for {0}")]
    JobNotFound(JobKey),
    #[error(transparent)]
    InvalidConfig(#[from] TaskDescriptionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
