// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time source for heartbeat and grace-period measurement.
//!
//! The scheduler never needs wall-clock time: it only measures how long a
//! placed task has gone unmentioned by its slave. Readings are taken under
//! the scheduler lock and stored as the task's volatile heartbeat, and the
//! clock is injected so tests can move time past the reconciliation grace
//! period instead of sleeping through it.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic readings.
pub trait Clock: Clone + Send + Sync {
    /// The current reading. Comparable only against readings from the
    /// same clock.
    fn now(&self) -> Instant;
}

/// The process monotonic clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that stands still until told otherwise.
///
/// Shared by clone: advancing any handle advances them all, so a test can
/// keep one handle while the scheduler under test holds another.
#[derive(Clone)]
pub struct FakeClock {
    now: Arc<Mutex<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { now: Arc::new(Mutex::new(Instant::now())) }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
