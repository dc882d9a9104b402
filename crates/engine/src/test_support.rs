// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fakes and fixtures for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::driver::{Driver, UpdateLauncher};
use crate::filter::{Offer, SchedulingFilter};
use crate::scheduler::{SchedulerConfig, SchedulerCore};
use crate::work_queue::WorkQueueWorker;
use herd_core::{
    FakeClock, JobConfiguration, Resources, ScheduledTask, TaskId, TaskInfo, TaskStatus,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Records kill requests instead of talking to a cluster master.
#[derive(Debug, Default)]
pub struct FakeDriver {
    kills: Mutex<Vec<TaskId>>,
}

impl FakeDriver {
    pub fn kills(&self) -> Vec<TaskId> {
        self.kills.lock().clone()
    }
}

impl Driver for FakeDriver {
    fn kill_task(&self, task: TaskId) -> i32 {
        self.kills.lock().push(task);
        0
    }
}

/// Records updater launches.
#[derive(Debug, Default)]
pub struct FakeUpdateLauncher {
    launches: Mutex<Vec<JobConfiguration>>,
}

impl FakeUpdateLauncher {
    pub fn launches(&self) -> Vec<JobConfiguration> {
        self.launches.lock().clone()
    }
}

impl UpdateLauncher for FakeUpdateLauncher {
    fn launch_updater(&self, job: &JobConfiguration) {
        self.launches.lock().push(job.clone());
    }
}

/// Filter that places any pending task on any offer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllFilter;

impl SchedulingFilter for AcceptAllFilter {
    fn make_filter<'a>(&'a self, _offer: &'a Offer) -> Box<dyn Fn(&ScheduledTask) -> bool + 'a> {
        Box::new(|_| true)
    }
}

/// Filter that declines every offer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAllFilter;

impl SchedulingFilter for RejectAllFilter {
    fn make_filter<'a>(&'a self, _offer: &'a Offer) -> Box<dyn Fn(&ScheduledTask) -> bool + 'a> {
        Box::new(|_| false)
    }
}

/// A shard description with test defaults.
pub fn shard(id: u32) -> TaskInfo {
    TaskInfo::builder("run-service").shard_id(id).build()
}

/// An immediate job with `shards` identical tasks.
pub fn job(owner: &str, name: &str, shards: u32) -> JobConfiguration {
    JobConfiguration::builder(owner, name)
        .tasks((0..shards).map(shard).collect())
        .build()
}

/// A daemon job with `shards` identical tasks.
pub fn daemon_job(owner: &str, name: &str, shards: u32) -> JobConfiguration {
    JobConfiguration::builder(owner, name)
        .tasks(
            (0..shards)
                .map(|i| TaskInfo::builder("run-service").daemon(true).shard_id(i).build())
                .collect(),
        )
        .build()
}

/// A standard 4-core offer from the given host.
pub fn offer(host: &str) -> Offer {
    Offer::new(format!("slave-{host}"), host, Resources::new(4.0, 4096, 8192))
}

pub type TestScheduler<F = AcceptAllFilter> =
    SchedulerCore<FakeDriver, F, Arc<FakeUpdateLauncher>, FakeClock>;

/// A scheduler wired to fakes, with the work-queue consumer held for
/// deterministic draining.
pub struct TestContext<F: SchedulingFilter = AcceptAllFilter> {
    pub scheduler: TestScheduler<F>,
    pub driver: Arc<FakeDriver>,
    pub launcher: Arc<FakeUpdateLauncher>,
    pub clock: FakeClock,
    pub worker: WorkQueueWorker,
}

impl<F: SchedulingFilter> TestContext<F> {
    /// Run everything currently sitting on the work queue.
    pub fn drain_work(&mut self) -> usize {
        self.worker.run_pending()
    }

    /// Report one slave's view of the given tasks.
    pub fn report(&self, host: &str, tasks: &[(TaskId, TaskStatus)]) {
        self.scheduler.update_registered_tasks(&crate::reconcile::RegisteredTaskUpdate {
            slave_host: host.to_string(),
            tasks: tasks
                .iter()
                .map(|&(task_id, status)| crate::reconcile::LiveTaskInfo {
                    task_id,
                    status,
                    resources: None,
                })
                .collect(),
        });
    }
}

/// Scheduler with the accept-all filter, registered against a fake driver.
pub fn setup() -> TestContext {
    setup_with_filter(AcceptAllFilter)
}

/// Scheduler with a caller-chosen filter, registered against a fake driver.
pub fn setup_with_filter<F: SchedulingFilter>(filter: F) -> TestContext<F> {
    let driver = Arc::new(FakeDriver::default());
    let launcher = Arc::new(FakeUpdateLauncher::default());
    let clock = FakeClock::new();
    let (scheduler, worker) = SchedulerCore::new(
        filter,
        Arc::clone(&launcher),
        clock.clone(),
        SchedulerConfig::default(),
    );
    scheduler.registered(Arc::clone(&driver), "fw-test");
    TestContext { scheduler, driver, launcher, clock, worker }
}
