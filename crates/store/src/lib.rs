// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herd-store: indexed task storage and snapshot persistence

pub mod snapshot;
pub mod task_store;

pub use snapshot::{FileSnapshotStore, Snapshot, SnapshotError, SnapshotStore};
pub use task_store::{StoreError, TaskStore};
