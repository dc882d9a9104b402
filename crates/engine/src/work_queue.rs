// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred-work channel keeping external I/O off the scheduler lock.
//!
//! Producers enqueue callables while holding the scheduler lock; a single
//! consumer runs them outside it. The callable's boolean says whether the
//! work is considered confirmed; it is logged, never acted on, because the
//! observable state change always arrives with a later slave report.

use tokio::sync::mpsc;
use tracing::{debug, warn};

pub type WorkItem = Box<dyn FnOnce() -> bool + Send + 'static>;

/// Producer handle. Cheap to clone.
#[derive(Clone)]
pub struct WorkQueue {
    tx: mpsc::UnboundedSender<WorkItem>,
}

impl WorkQueue {
    pub fn new() -> (WorkQueue, WorkQueueWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (WorkQueue { tx }, WorkQueueWorker { rx })
    }

    pub fn do_work(&self, item: WorkItem) {
        if self.tx.send(item).is_err() {
            warn!("work queue consumer gone; dropping work item");
        }
    }
}

/// The single consumer end.
pub struct WorkQueueWorker {
    rx: mpsc::UnboundedReceiver<WorkItem>,
}

impl WorkQueueWorker {
    /// Consume items until every producer handle is dropped.
    pub async fn run(mut self) {
        while let Some(item) = self.rx.recv().await {
            let confirmed = item();
            debug!(confirmed, "work item completed");
        }
    }

    /// Drain items already queued without waiting; returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(item) = self.rx.try_recv() {
            let confirmed = item();
            debug!(confirmed, "work item completed");
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
#[path = "work_queue_tests.rs"]
mod tests;
