// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Indexed collection of scheduled tasks.
//!
//! Primary storage is insertion-ordered; owner and status indices narrow
//! candidate selection, and the query's remaining fields (including its
//! arbitrary predicate) run as the final stage. Results come back in
//! ascending task-id order, which equals insertion order because ids are
//! assigned from a monotonic counter.

use herd_core::{ScheduledTask, TaskId, TaskQuery, TaskStatus};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("task id {0} already present in the store")]
    DuplicateTaskId(TaskId),
}

#[derive(Debug, Default, Clone)]
pub struct TaskStore {
    tasks: IndexMap<TaskId, ScheduledTask>,
    by_owner: HashMap<String, BTreeSet<TaskId>>,
    by_status: HashMap<TaskStatus, BTreeSet<TaskId>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&ScheduledTask> {
        self.tasks.get(&id)
    }

    /// Insert new tasks. Rejects the whole batch on any id collision
    /// (against the store or within the batch itself).
    pub fn add(&mut self, tasks: Vec<ScheduledTask>) -> Result<(), StoreError> {
        let mut incoming = BTreeSet::new();
        for task in &tasks {
            if self.tasks.contains_key(&task.id) || !incoming.insert(task.id) {
                return Err(StoreError::DuplicateTaskId(task.id));
            }
        }
        for task in tasks {
            self.index(&task);
            self.tasks.insert(task.id, task);
        }
        Ok(())
    }

    /// Snapshot of every task matching the query, ascending by id.
    pub fn fetch(&self, query: &TaskQuery) -> Vec<ScheduledTask> {
        self.candidate_ids(query)
            .into_iter()
            .filter_map(|id| self.tasks.get(&id))
            .filter(|task| query.matches(task))
            .cloned()
            .collect()
    }

    /// Atomically apply a mutation to every match; returns the updated set.
    pub fn mutate(
        &mut self,
        query: &TaskQuery,
        mut mutation: impl FnMut(&mut ScheduledTask),
    ) -> Vec<ScheduledTask> {
        let candidates = self.candidate_ids(query);
        let mut updated = Vec::new();
        for id in candidates {
            let Some(task) = self.tasks.get_mut(&id) else {
                continue;
            };
            if !query.matches(task) {
                continue;
            }
            let before = task.status();
            mutation(task);
            let after = task.status();
            updated.push(task.clone());
            if before != after {
                remove_from(&mut self.by_status, before, id);
                self.by_status.entry(after).or_default().insert(id);
            }
        }
        updated
    }

    /// Delete every match; returns the removed tasks.
    pub fn remove(&mut self, query: &TaskQuery) -> Vec<ScheduledTask> {
        let victims: Vec<TaskId> = self
            .candidate_ids(query)
            .into_iter()
            .filter(|id| self.tasks.get(id).is_some_and(|t| query.matches(t)))
            .collect();
        let mut removed = Vec::new();
        for id in victims {
            if let Some(task) = self.tasks.shift_remove(&id) {
                self.unindex(&task);
                removed.push(task);
            }
        }
        removed
    }

    /// Candidate ids from the most selective indexed field, ascending.
    fn candidate_ids(&self, query: &TaskQuery) -> Vec<TaskId> {
        if let Some(ids) = &query.ids {
            let mut out: Vec<TaskId> =
                ids.iter().copied().filter(|id| self.tasks.contains_key(id)).collect();
            out.sort_unstable();
            return out;
        }
        if let Some(owner) = &query.owner {
            return self
                .by_owner
                .get(owner)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default();
        }
        if let Some(statuses) = &query.statuses {
            let mut out = BTreeSet::new();
            for status in statuses {
                if let Some(set) = self.by_status.get(status) {
                    out.extend(set.iter().copied());
                }
            }
            return out.into_iter().collect();
        }
        self.tasks.keys().copied().collect()
    }

    fn index(&mut self, task: &ScheduledTask) {
        self.by_owner.entry(task.job.owner.clone()).or_default().insert(task.id);
        self.by_status.entry(task.status()).or_default().insert(task.id);
    }

    fn unindex(&mut self, task: &ScheduledTask) {
        if let Some(set) = self.by_owner.get_mut(&task.job.owner) {
            set.remove(&task.id);
            if set.is_empty() {
                self.by_owner.remove(&task.job.owner);
            }
        }
        remove_from(&mut self.by_status, task.status(), task.id);
    }
}

fn remove_from(index: &mut HashMap<TaskStatus, BTreeSet<TaskId>>, status: TaskStatus, id: TaskId) {
    if let Some(set) = index.get_mut(&status) {
        set.remove(&id);
        if set.is_empty() {
            index.remove(&status);
        }
    }
}

#[cfg(test)]
#[path = "task_store_tests.rs"]
mod tests;
