// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job intake: the manager chain and task materialization.
//!
//! Managers are consulted in priority order; the first acceptor owns the
//! job. The ability to create tasks is passed downward as a [`TaskFactory`]
//! borrowing the store and the id counter, so no manager holds a reference
//! back into the scheduler.

use crate::error::ScheduleError;
use herd_core::{JobConfiguration, JobKey, ScheduledTask, TaskId};
use herd_store::TaskStore;
use std::collections::HashMap;
use tracing::info;

/// Task-creation capability handed to managers at the call site.
pub(crate) struct TaskFactory<'a> {
    store: &'a mut TaskStore,
    next_task_id: &'a mut u64,
}

impl<'a> TaskFactory<'a> {
    pub(crate) fn new(store: &'a mut TaskStore, next_task_id: &'a mut u64) -> Self {
        Self { store, next_task_id }
    }

    fn next_id(&mut self) -> TaskId {
        *self.next_task_id += 1;
        TaskId::new(*self.next_task_id)
    }

    /// Materialize one PENDING task per shard of a populated configuration.
    pub(crate) fn materialize(
        &mut self,
        job: &JobConfiguration,
    ) -> Result<Vec<TaskId>, ScheduleError> {
        let mut tasks = Vec::with_capacity(job.tasks.len());
        let mut created = Vec::with_capacity(job.tasks.len());
        for info in &job.tasks {
            let id = self.next_id();
            let shard = info.shard_id.unwrap_or_default();
            tasks.push(ScheduledTask::new(id, job.key.clone(), shard, info.clone()));
            created.push(id);
        }
        self.store.add(tasks)?;
        Ok(created)
    }
}

/// One link in the intake chain.
pub(crate) trait JobManager {
    /// Offer a job to this manager. `None` means "not mine"; `Some(ids)`
    /// means accepted, with the tasks materialized so far.
    fn receive_job(
        &mut self,
        factory: &mut TaskFactory<'_>,
        job: &JobConfiguration,
    ) -> Result<Option<Vec<TaskId>>, ScheduleError>;

    fn has_job(&self, store: &TaskStore, key: &JobKey) -> bool;

    fn delete_job(&mut self, key: &JobKey) -> bool;
}

/// Materializes tasks into the store at submit time.
#[derive(Debug, Default)]
pub(crate) struct ImmediateJobManager;

impl JobManager for ImmediateJobManager {
    fn receive_job(
        &mut self,
        factory: &mut TaskFactory<'_>,
        job: &JobConfiguration,
    ) -> Result<Option<Vec<TaskId>>, ScheduleError> {
        if job.is_cron() {
            return Ok(None);
        }
        let created = factory.materialize(job)?;
        info!(job = %job.key, tasks = created.len(), "job accepted");
        Ok(Some(created))
    }

    fn has_job(&self, store: &TaskStore, key: &JobKey) -> bool {
        !store.fetch(&herd_core::TaskQuery::active(key)).is_empty()
    }

    fn delete_job(&mut self, _key: &JobKey) -> bool {
        // Nothing stored here; live tasks are killed through the store.
        false
    }
}

/// Stores cron configurations and materializes tasks when the trigger
/// clock fires (see `SchedulerCore::cron_triggered`).
#[derive(Debug, Default, Clone)]
pub(crate) struct CronJobManager {
    jobs: HashMap<JobKey, JobConfiguration>,
}

impl CronJobManager {
    pub(crate) fn from_configs(configs: Vec<JobConfiguration>) -> Self {
        Self { jobs: configs.into_iter().map(|j| (j.key.clone(), j)).collect() }
    }

    pub(crate) fn get(&self, key: &JobKey) -> Option<&JobConfiguration> {
        self.jobs.get(key)
    }

    /// Replace the stored configuration (job updates).
    pub(crate) fn replace(&mut self, job: JobConfiguration) {
        self.jobs.insert(job.key.clone(), job);
    }

    pub(crate) fn configs(&self) -> impl Iterator<Item = &JobConfiguration> {
        self.jobs.values()
    }
}

impl JobManager for CronJobManager {
    fn receive_job(
        &mut self,
        _factory: &mut TaskFactory<'_>,
        job: &JobConfiguration,
    ) -> Result<Option<Vec<TaskId>>, ScheduleError> {
        if !job.is_cron() {
            return Ok(None);
        }
        self.jobs.insert(job.key.clone(), job.clone());
        info!(job = %job.key, schedule = ?job.cron_schedule, "cron job accepted");
        Ok(Some(Vec::new()))
    }

    fn has_job(&self, _store: &TaskStore, key: &JobKey) -> bool {
        self.jobs.contains_key(key)
    }

    fn delete_job(&mut self, key: &JobKey) -> bool {
        self.jobs.remove(key).is_some()
    }
}

#[cfg(test)]
#[path = "job_manager_tests.rs"]
mod tests;
