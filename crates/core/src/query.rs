// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task selection descriptors.
//!
//! A [`TaskQuery`] is the conjunction of its provided fields: owner, job
//! name, id set, status set, and an arbitrary final predicate. The store
//! plans candidate lookup from the indexed fields and runs the predicate
//! last.

use crate::job::JobKey;
use crate::task::{ScheduledTask, TaskId, TaskStatus};
use std::collections::HashSet;
use std::sync::Arc;

/// Final-stage filter applied after indexed selection.
pub type TaskPredicate = Arc<dyn Fn(&ScheduledTask) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct TaskQuery {
    pub owner: Option<String>,
    pub job_name: Option<String>,
    pub ids: Option<HashSet<TaskId>>,
    pub statuses: Option<HashSet<TaskStatus>>,
    pub predicate: Option<TaskPredicate>,
}

impl TaskQuery {
    /// Match every task in the store.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: TaskId) -> Self {
        Self::by_ids([id])
    }

    pub fn by_ids(ids: impl IntoIterator<Item = TaskId>) -> Self {
        Self { ids: Some(ids.into_iter().collect()), ..Self::default() }
    }

    pub fn by_status(status: TaskStatus) -> Self {
        Self::by_statuses([status])
    }

    pub fn by_statuses(statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        Self { statuses: Some(statuses.into_iter().collect()), ..Self::default() }
    }

    pub fn by_job(key: &JobKey) -> Self {
        Self {
            owner: Some(key.owner.clone()),
            job_name: Some(key.name.clone()),
            ..Self::default()
        }
    }

    /// PENDING ∪ STARTING ∪ RUNNING, filtered to one job.
    pub fn active(key: &JobKey) -> Self {
        Self {
            statuses: Some(TaskStatus::ACTIVE.into_iter().collect()),
            ..Self::by_job(key)
        }
    }

    crate::setters! {
        option {
            owner: String,
            job_name: String,
        }
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        self.statuses = Some(statuses.into_iter().collect());
        self
    }

    pub fn predicate(
        mut self,
        predicate: impl Fn(&ScheduledTask) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Whether the task satisfies every provided field.
    pub fn matches(&self, task: &ScheduledTask) -> bool {
        if let Some(owner) = &self.owner {
            if task.job.owner != *owner {
                return false;
            }
        }
        if let Some(name) = &self.job_name {
            if task.job.name != *name {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&task.id) {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&task.status()) {
                return false;
            }
        }
        if let Some(predicate) = &self.predicate {
            if !predicate(task) {
                return false;
            }
        }
        true
    }
}

impl std::fmt::Debug for TaskQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQuery")
            .field("owner", &self.owner)
            .field("job_name", &self.job_name)
            .field("ids", &self.ids)
            .field("statuses", &self.statuses)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
