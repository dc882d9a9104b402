// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler facade: intake, offer matching, status updates, kills,
//! restarts, and persistence.
//!
//! Single-writer model: all mutating operations take the one write lock,
//! queries take the read lock. External I/O (driver kills) never happens
//! under the lock; it is enqueued on the work queue instead.

use crate::driver::{Driver, UpdateLauncher};
use crate::error::ScheduleError;
use crate::filter::{Offer, SchedulingFilter, TaskAssignment};
use crate::job_manager::{CronJobManager, ImmediateJobManager, JobManager, TaskFactory};
use crate::state_machine::{self, TaskEffect, Transition};
use crate::work_queue::{WorkQueue, WorkQueueWorker};
use herd_core::{
    Clock, JobConfiguration, JobKey, ScheduledTask, SlaveRef, TaskId, TaskQuery, TaskStatus,
};
use herd_store::{Snapshot, SnapshotStore, TaskStore};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Tunables for the scheduler core.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How long a placed task may be absent from its slave's reports before
    /// reconciliation declares it LOST.
    pub missing_task_grace: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { missing_task_grace: Duration::from_secs(600) }
    }
}

/// State guarded by the scheduler lock.
pub(crate) struct Inner {
    pub(crate) store: TaskStore,
    pub(crate) crons: CronJobManager,
    pub(crate) next_task_id: u64,
    pub(crate) framework_id: Option<String>,
}

pub struct SchedulerCore<D, F, U, C>
where
    D: Driver + 'static,
    F: SchedulingFilter,
    U: UpdateLauncher,
    C: Clock,
{
    pub(crate) inner: RwLock<Inner>,
    pub(crate) filter: F,
    pub(crate) updater: U,
    pub(crate) clock: C,
    pub(crate) config: SchedulerConfig,
    work_queue: WorkQueue,
    driver: Mutex<Option<Arc<D>>>,
}

impl<D, F, U, C> SchedulerCore<D, F, U, C>
where
    D: Driver + 'static,
    F: SchedulingFilter,
    U: UpdateLauncher,
    C: Clock,
{
    /// Build a core plus the consumer end of its work queue. The caller
    /// decides where the worker runs (usually a spawned task).
    pub fn new(filter: F, updater: U, clock: C, config: SchedulerConfig) -> (Self, WorkQueueWorker) {
        let (work_queue, worker) = WorkQueue::new();
        let core = Self {
            inner: RwLock::new(Inner {
                store: TaskStore::new(),
                crons: CronJobManager::default(),
                next_task_id: 0,
                framework_id: None,
            }),
            filter,
            updater,
            clock,
            config,
            work_queue,
            driver: Mutex::new(None),
        };
        (core, worker)
    }

    /// Bind the driver used for kill dispatches and retain the framework id.
    pub fn registered(&self, driver: Arc<D>, framework_id: &str) {
        *self.driver.lock() = Some(driver);
        self.inner.write().framework_id = Some(framework_id.to_string());
        info!(framework_id, "registered with cluster master");
    }

    /// Validate, reject duplicates, and route through the manager chain.
    /// Returns the ids of any tasks materialized at submit time.
    pub fn create_job(&self, job: JobConfiguration) -> Result<Vec<TaskId>, ScheduleError> {
        let job = herd_core::validate_and_populate(job)?;
        let mut inner = self.inner.write();
        let Inner { store, crons, next_task_id, .. } = &mut *inner;

        let mut immediate = ImmediateJobManager;
        if crons.has_job(store, &job.key) || immediate.has_job(store, &job.key) {
            return Err(ScheduleError::DuplicateJob(job.key));
        }

        let mut factory = TaskFactory::new(store, next_task_id);
        let managers: [&mut dyn JobManager; 2] = [crons, &mut immediate];
        for manager in managers {
            if let Some(created) = manager.receive_job(&mut factory, &job)? {
                return Ok(created);
            }
        }
        // Unreachable: the immediate manager accepts any non-cron job.
        Err(ScheduleError::JobNotFound(job.key))
    }

    /// Match one pending task against an offer. `None` declines the offer.
    pub fn offer(&self, offer: &Offer) -> Option<TaskAssignment> {
        let mut inner = self.inner.write();
        let candidate = {
            let predicate = self.filter.make_filter(offer);
            // Pending tasks come back ascending by id: FIFO, starvation-free.
            inner
                .store
                .fetch(&TaskQuery::by_status(TaskStatus::Pending))
                .into_iter()
                .find(|task| predicate(task))?
        };

        let slave = SlaveRef::new(&offer.slave_id, &offer.slave_host);
        let now = self.clock.now();
        inner.store.mutate(&TaskQuery::by_id(candidate.id), |task| {
            if let Transition::Applied { .. } =
                state_machine::apply(task, TaskStatus::Starting, Some(slave.clone()))
            {
                task.last_seen = Some(now);
            }
        });
        info!(task = %candidate.id, job = %candidate.job, slave = %offer.slave_host, "task launched");
        Some(TaskAssignment {
            task_id: candidate.id,
            slave_id: offer.slave_id.clone(),
            slave_host: offer.slave_host.clone(),
            task: candidate.info,
        })
    }

    /// Apply the state machine to every task matching the query. Returns
    /// the tasks that actually reached `status`.
    pub fn set_task_status(&self, query: &TaskQuery, status: TaskStatus) -> Vec<ScheduledTask> {
        let mut inner = self.inner.write();
        self.transition_matching(&mut inner, query, status)
    }

    /// Kill matching work: pending tasks are deleted, placed tasks are
    /// driven to KILLED_BY_CLIENT with a driver kill enqueued, and a
    /// cron-only job named by the query has its definition removed.
    /// Returns the number of affected entities.
    pub fn kill_tasks(&self, query: &TaskQuery) -> usize {
        let mut inner = self.inner.write();
        let matches = inner.store.fetch(query);
        let mut affected = 0;

        let pending: Vec<TaskId> = matches
            .iter()
            .filter(|t| t.status() == TaskStatus::Pending)
            .map(|t| t.id)
            .collect();
        if !pending.is_empty() {
            affected += inner.store.remove(&TaskQuery::by_ids(pending)).len();
        }

        let placed: Vec<TaskId> = matches
            .iter()
            .filter(|t| matches!(t.status(), TaskStatus::Starting | TaskStatus::Running))
            .map(|t| t.id)
            .collect();
        affected += self
            .transition_matching(&mut inner, &TaskQuery::by_ids(placed), TaskStatus::KilledByClient)
            .len();

        if let (Some(owner), Some(name)) = (&query.owner, &query.job_name) {
            let key = JobKey::new(owner.clone(), name.clone());
            if inner.crons.delete_job(&key) {
                info!(job = %key, "cron job removed");
                affected += 1;
            }
        }

        if affected == 0 {
            info!(?query, "kill request matched nothing");
        }
        affected
    }

    /// Restart the given tasks: each active one is driven to
    /// KILLED_BY_CLIENT and replaced by a fresh PENDING attempt on the same
    /// shard. Unknown and inactive ids are dropped; the accepted subset is
    /// returned in input order.
    pub fn restart_tasks(&self, ids: &[TaskId]) -> Vec<TaskId> {
        let mut inner = self.inner.write();
        let mut accepted = Vec::new();
        for &id in ids {
            let Some(task) = inner.store.get(id).cloned() else {
                warn!(task = %id, "restart of unknown task ignored");
                continue;
            };
            if !task.is_active() {
                warn!(task = %id, status = %task.status(), "restart of inactive task ignored");
                continue;
            }
            self.transition_matching(
                &mut inner,
                &TaskQuery::by_id(id),
                TaskStatus::KilledByClient,
            );
            self.run_effects(&mut inner, vec![TaskEffect::Reschedule { ancestor: id }]);
            accepted.push(id);
        }
        accepted
    }

    /// Materialize a cron job's tasks in response to the trigger clock.
    pub fn cron_triggered(&self, key: &JobKey) -> Result<Vec<TaskId>, ScheduleError> {
        use herd_core::CronCollisionPolicy::*;

        let mut inner = self.inner.write();
        let Some(job) = inner.crons.get(key).cloned() else {
            return Err(ScheduleError::JobNotFound(key.clone()));
        };

        let active = inner.store.fetch(&TaskQuery::active(key));
        if !active.is_empty() {
            match job.collision_policy() {
                CancelNew => {
                    info!(job = %key, "cron firing skipped, previous generation still active");
                    return Ok(Vec::new());
                }
                KillExisting => {
                    info!(job = %key, active = active.len(), "cron collision, killing previous generation");
                    let pending: Vec<TaskId> = active
                        .iter()
                        .filter(|t| t.status() == TaskStatus::Pending)
                        .map(|t| t.id)
                        .collect();
                    inner.store.remove(&TaskQuery::by_ids(pending));
                    let placed: Vec<TaskId> = active
                        .iter()
                        .filter(|t| matches!(t.status(), TaskStatus::Starting | TaskStatus::Running))
                        .map(|t| t.id)
                        .collect();
                    self.transition_matching(
                        &mut inner,
                        &TaskQuery::by_ids(placed),
                        TaskStatus::KilledByClient,
                    );
                }
                RunOverlap => {}
            }
        }

        let Inner { store, next_task_id, .. } = &mut *inner;
        let created = TaskFactory::new(store, next_task_id).materialize(&job)?;
        info!(job = %key, tasks = created.len(), "cron fired");
        Ok(created)
    }

    /// Passthrough query against the store.
    pub fn get_tasks(&self, query: &TaskQuery) -> Vec<ScheduledTask> {
        self.inner.read().store.fetch(query)
    }

    /// The registered cron job configurations.
    pub fn jobs(&self) -> Vec<JobConfiguration> {
        self.inner.read().crons.configs().cloned().collect()
    }

    /// Serialize durable state: id counter, tasks, cron jobs, framework id.
    pub fn snapshot(&self) -> Result<Vec<u8>, ScheduleError> {
        let inner = self.inner.read();
        let snapshot = Snapshot {
            task_counter: inner.next_task_id,
            tasks: inner.store.fetch(&TaskQuery::all()),
            cron_jobs: inner.crons.configs().cloned().collect(),
            framework_id: inner.framework_id.clone(),
        };
        Ok(snapshot.encode()?)
    }

    /// Replace all state from a snapshot. Reseeds the id counter so ids
    /// stay strictly increasing across restarts.
    pub fn restore(&self, bytes: &[u8]) -> Result<(), ScheduleError> {
        let snapshot = Snapshot::decode(bytes)?;
        let mut store = TaskStore::new();
        let task_count = snapshot.tasks.len();
        store.add(snapshot.tasks)?;

        let mut inner = self.inner.write();
        inner.store = store;
        inner.crons = CronJobManager::from_configs(snapshot.cron_jobs);
        inner.next_task_id = snapshot.task_counter;
        inner.framework_id = snapshot.framework_id;
        info!(tasks = task_count, counter = inner.next_task_id, "state restored from snapshot");
        Ok(())
    }

    /// Snapshot into a durable sink, logging failures instead of
    /// propagating them: recovery degrades to the last good snapshot.
    pub fn checkpoint(&self, sink: &dyn SnapshotStore) {
        match self.snapshot() {
            Ok(bytes) => {
                if let Err(error) = sink.save(&bytes) {
                    warn!(%error, "snapshot save failed");
                }
            }
            Err(error) => warn!(%error, "snapshot encoding failed"),
        }
    }

    /// Drive every task matching `query` toward `target`, then run the
    /// produced effects. Returns the tasks that reached `target`.
    pub(crate) fn transition_matching(
        &self,
        inner: &mut Inner,
        query: &TaskQuery,
        target: TaskStatus,
    ) -> Vec<ScheduledTask> {
        let mut effects = Vec::new();
        let updated = inner.store.mutate(query, |task| {
            if let Transition::Applied { effects: produced } =
                state_machine::apply(task, target, None)
            {
                effects.extend(produced);
            }
        });
        self.run_effects(inner, effects);
        updated.into_iter().filter(|t| t.status() == target).collect()
    }

    /// Execute transition effects: create replacement tasks and enqueue
    /// driver kills.
    pub(crate) fn run_effects(&self, inner: &mut Inner, effects: Vec<TaskEffect>) {
        for effect in effects {
            match effect {
                TaskEffect::Reschedule { ancestor } => {
                    let Some(parent) = inner.store.get(ancestor).cloned() else {
                        warn!(task = %ancestor, "reschedule source vanished");
                        continue;
                    };
                    inner.next_task_id += 1;
                    let replacement = parent.reschedule(TaskId::new(inner.next_task_id));
                    let id = replacement.id;
                    if let Err(error) = inner.store.add(vec![replacement]) {
                        warn!(%error, "replacement task insert failed");
                        continue;
                    }
                    info!(ancestor = %ancestor, task = %id, shard = parent.shard, "task rescheduled");
                }
                TaskEffect::KillViaDriver { task } => self.enqueue_kill(task),
            }
        }
    }

    fn enqueue_kill(&self, task: TaskId) {
        let Some(driver) = self.driver.lock().clone() else {
            warn!(task = %task, "kill requested before driver registration");
            return;
        };
        self.work_queue.do_work(Box::new(move || {
            let code = driver.kill_task(task);
            tracing::debug!(task = %task, code, "driver kill issued");
            code == 0
        }));
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
