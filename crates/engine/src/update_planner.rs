// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job update diff engine.
//!
//! Given the stored job and a replacement configuration, decides whether
//! the change is a no-op, can be applied in place, or needs the external
//! rolling updater.

use crate::driver::{Driver, UpdateLauncher};
use crate::error::ScheduleError;
use crate::filter::SchedulingFilter;
use crate::scheduler::SchedulerCore;
use herd_core::{
    validate_and_populate, Clock, JobConfiguration, ScheduledTask, TaskId, TaskInfo, TaskQuery,
    TaskStatus,
};
use std::collections::BTreeMap;
use tracing::info;

/// Outcome of [`SchedulerCore::update_job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobUpdateResult {
    /// The new configuration equals the stored one.
    JobUnchanged,
    /// The new configuration equals the stored cron configuration.
    JobUnchangedCron,
    /// The change was applied in place.
    Completed,
    /// The change needs a rolling update; the external updater was launched.
    UpdaterLaunched,
}

/// Equality ignoring the fields an in-place update may rewrite.
fn runtime_equal(a: &TaskInfo, b: &TaskInfo) -> bool {
    let strip = |info: &TaskInfo| {
        let mut info = info.clone();
        info.priority = None;
        info.max_task_failures = None;
        info
    };
    strip(a) == strip(b)
}

impl<D, F, U, C> SchedulerCore<D, F, U, C>
where
    D: Driver + 'static,
    F: SchedulingFilter,
    U: UpdateLauncher,
    C: Clock,
{
    /// Plan and apply an update of the job named by `new.key`.
    pub fn update_job(&self, new: JobConfiguration) -> Result<JobUpdateResult, ScheduleError> {
        let new = validate_and_populate(new)?;
        let mut inner = self.inner.write();

        // Cron jobs update by swapping the stored configuration; the next
        // firing materializes from it.
        if let Some(existing) = inner.crons.get(&new.key).cloned() {
            if existing == new {
                return Ok(JobUpdateResult::JobUnchangedCron);
            }
            info!(job = %new.key, "cron job configuration replaced");
            inner.crons.replace(new);
            return Ok(JobUpdateResult::Completed);
        }

        let tasks = inner.store.fetch(&TaskQuery::by_job(&new.key));
        if tasks.is_empty() {
            return Err(ScheduleError::JobNotFound(new.key));
        }

        // Latest attempt per shard. Ids ascend, so the active attempt (if
        // any) is always the one kept here.
        let mut latest: BTreeMap<u32, ScheduledTask> = BTreeMap::new();
        for task in tasks {
            latest.insert(task.shard, task);
        }
        let new_infos: BTreeMap<u32, &TaskInfo> = new
            .tasks
            .iter()
            .filter_map(|t| t.shard_id.map(|s| (s, t)))
            .collect();

        let unchanged = latest.len() == new_infos.len()
            && latest
                .iter()
                .all(|(shard, task)| new_infos.get(shard).is_some_and(|info| task.info == **info));
        if unchanged {
            return Ok(JobUpdateResult::JobUnchanged);
        }

        // Anything beyond priority / failure-budget changes on a retained
        // shard needs the rolling updater.
        let needs_updater = latest.iter().any(|(shard, task)| {
            new_infos.get(shard).is_some_and(|info| !runtime_equal(&task.info, info))
        });
        if needs_updater {
            self.updater.launch_updater(&new);
            info!(job = %new.key, "update delegated to the rolling updater");
            return Ok(JobUpdateResult::UpdaterLaunched);
        }

        // In place: kill shards the update drops.
        for (shard, task) in &latest {
            if new_infos.contains_key(shard) {
                continue;
            }
            match task.status() {
                TaskStatus::Pending => {
                    inner.store.remove(&TaskQuery::by_id(task.id));
                }
                TaskStatus::Starting | TaskStatus::Running => {
                    self.transition_matching(
                        &mut inner,
                        &TaskQuery::by_id(task.id),
                        TaskStatus::KilledByClient,
                    );
                }
                _ => {}
            }
        }

        // Retained shards keep their attempt but carry the new description;
        // shards whose last attempt ended get a fresh one.
        for (shard, task) in &latest {
            let Some(info) = new_infos.get(shard) else {
                continue;
            };
            if task.is_active() {
                let info = (*info).clone();
                inner
                    .store
                    .mutate(&TaskQuery::by_id(task.id), move |t| t.info = info.clone());
            } else {
                inner.next_task_id += 1;
                let fresh = ScheduledTask::new(
                    TaskId::new(inner.next_task_id),
                    new.key.clone(),
                    *shard,
                    (*info).clone(),
                );
                inner.store.add(vec![fresh])?;
            }
        }

        // Shards the update adds.
        for (shard, info) in &new_infos {
            if latest.contains_key(shard) {
                continue;
            }
            inner.next_task_id += 1;
            let fresh = ScheduledTask::new(
                TaskId::new(inner.next_task_id),
                new.key.clone(),
                *shard,
                (*info).clone(),
            );
            inner.store.add(vec![fresh])?;
        }

        info!(job = %new.key, "job updated in place");
        Ok(JobUpdateResult::Completed)
    }
}

#[cfg(test)]
#[path = "update_planner_tests.rs"]
mod tests;
