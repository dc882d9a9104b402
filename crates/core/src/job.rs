// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identity and configuration.

use crate::task::TaskInfo;
use serde::{Deserialize, Serialize};

/// The (owner, name) pair identifying a job. Globally unique across
/// active jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub owner: String,
    pub name: String,
}

impl JobKey {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }
}

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What a cron firing does when the previous generation is still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CronCollisionPolicy {
    /// Kill the active generation, then materialize the new one
    #[default]
    KillExisting,
    /// Skip this firing entirely
    CancelNew,
    /// Materialize the new generation alongside the active one
    RunOverlap,
}

crate::simple_display! {
    CronCollisionPolicy {
        KillExisting => "kill_existing",
        CancelNew => "cancel_new",
        RunOverlap => "run_overlap",
    }
}

/// A submitted job: its key, its shards, and (for cron jobs) the schedule.
///
/// Shard ids within a job must form the contiguous range `[0, N)`;
/// [`crate::config::validate_and_populate`] enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfiguration {
    pub key: JobKey,
    pub tasks: Vec<TaskInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_collision_policy: Option<CronCollisionPolicy>,
}

impl JobConfiguration {
    pub fn builder(owner: impl Into<String>, name: impl Into<String>) -> JobConfigurationBuilder {
        JobConfigurationBuilder {
            key: JobKey::new(owner, name),
            tasks: Vec::new(),
            cron_schedule: None,
            cron_collision_policy: None,
        }
    }

    pub fn is_cron(&self) -> bool {
        self.cron_schedule.is_some()
    }

    pub fn collision_policy(&self) -> CronCollisionPolicy {
        self.cron_collision_policy.unwrap_or_default()
    }
}

pub struct JobConfigurationBuilder {
    key: JobKey,
    tasks: Vec<TaskInfo>,
    cron_schedule: Option<String>,
    cron_collision_policy: Option<CronCollisionPolicy>,
}

impl JobConfigurationBuilder {
    crate::setters! {
        set {
            tasks: Vec<TaskInfo>,
        }
        option {
            cron_schedule: String,
            cron_collision_policy: CronCollisionPolicy,
        }
    }

    /// Append one shard description.
    pub fn task(mut self, task: TaskInfo) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn build(self) -> JobConfiguration {
        JobConfiguration {
            key: self.key,
            tasks: self.tasks,
            cron_schedule: self.cron_schedule,
            cron_collision_policy: self.cron_collision_policy,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
