// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation of scheduler state against slave-reported reality.
//!
//! A slave is authoritative only for tasks it owns: reports naming unknown
//! tasks, or tasks placed on a different slave, are ignored. Tasks the
//! slave should know about but stopped mentioning are given a grace period
//! before being declared LOST.

use crate::driver::{Driver, ExecutorStatus, UpdateLauncher};
use crate::filter::SchedulingFilter;
use crate::scheduler::SchedulerCore;
use crate::state_machine::{self, Transition};
use herd_core::{Clock, ResourceUsage, TaskId, TaskQuery, TaskStatus};
use std::collections::HashSet;
use tracing::warn;

/// One task as the slave currently sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveTaskInfo {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub resources: Option<ResourceUsage>,
}

/// A slave's full task inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredTaskUpdate {
    pub slave_host: String,
    pub tasks: Vec<LiveTaskInfo>,
}

/// Query for the tasks a slave is expected to be running.
fn expected_on(host: &str) -> TaskQuery {
    let host = host.to_string();
    TaskQuery::by_statuses([TaskStatus::Starting, TaskStatus::Running])
        .predicate(move |t| t.slave_host() == Some(host.as_str()))
}

impl<D, F, U, C> SchedulerCore<D, F, U, C>
where
    D: Driver + 'static,
    F: SchedulingFilter,
    U: UpdateLauncher,
    C: Clock,
{
    /// Fold one slave's inventory report into the store.
    pub fn update_registered_tasks(&self, report: &RegisteredTaskUpdate) {
        let mut inner = self.inner.write();
        let now = self.clock.now();
        let mut reported = HashSet::new();
        let mut effects = Vec::new();

        for live in &report.tasks {
            let Some(task) = inner.store.get(live.task_id) else {
                warn!(task = %live.task_id, slave = %report.slave_host, "report for unknown task ignored");
                continue;
            };
            if task.slave_host() != Some(report.slave_host.as_str()) {
                warn!(
                    task = %live.task_id,
                    reporter = %report.slave_host,
                    assigned = ?task.slave_host(),
                    "cross-slave report ignored"
                );
                continue;
            }
            reported.insert(live.task_id);

            let differs = task.status() != live.status;
            inner.store.mutate(&TaskQuery::by_id(live.task_id), |task| {
                task.last_seen = Some(now);
                if let Some(usage) = live.resources {
                    task.usage = Some(usage);
                }
                if differs {
                    if let Transition::Applied { effects: produced } =
                        state_machine::apply(task, live.status, None)
                    {
                        effects.extend(produced);
                    }
                }
            });
        }

        // Tasks this slave should know about but no longer mentions.
        for task in inner.store.fetch(&expected_on(&report.slave_host)) {
            if reported.contains(&task.id) {
                continue;
            }
            match task.last_seen {
                Some(seen) if now.duration_since(seen) > self.config.missing_task_grace => {
                    warn!(task = %task.id, slave = %report.slave_host, "missing beyond grace period, marking lost");
                    inner.store.mutate(&TaskQuery::by_id(task.id), |task| {
                        if let Transition::Applied { effects: produced } =
                            state_machine::apply(task, TaskStatus::Lost, None)
                        {
                            effects.extend(produced);
                        }
                    });
                }
                Some(_) => {}
                // No heartbeat on record (fresh restore): start the clock
                // instead of declaring the task lost outright.
                None => {
                    inner.store.mutate(&TaskQuery::by_id(task.id), |task| {
                        task.last_seen = Some(now);
                    });
                }
            }
        }

        self.run_effects(&mut inner, effects);
    }

    /// Fold an executor consumption report into the volatile task fields.
    pub fn executor_status(&self, status: &ExecutorStatus) {
        let mut inner = self.inner.write();
        let now = self.clock.now();
        for (id, usage) in &status.usage {
            let Some(task) = inner.store.get(*id) else {
                warn!(task = %id, slave = %status.slave_host, "usage report for unknown task ignored");
                continue;
            };
            if task.slave_host() != Some(status.slave_host.as_str()) {
                warn!(task = %id, reporter = %status.slave_host, "cross-slave usage report ignored");
                continue;
            }
            inner.store.mutate(&TaskQuery::by_id(*id), |task| {
                task.usage = Some(*usage);
                task.last_seen = Some(now);
            });
        }
    }

    /// An executor restarted: everything placed on that slave is gone.
    /// Drives the slave's STARTING/RUNNING tasks to LOST (rescheduling them).
    pub fn executor_restarted(&self, slave_host: &str) {
        let mut inner = self.inner.write();
        let lost = self.transition_matching(&mut inner, &expected_on(slave_host), TaskStatus::Lost);
        if !lost.is_empty() {
            warn!(slave = slave_host, tasks = lost.len(), "executor restarted, active tasks lost");
        }
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
