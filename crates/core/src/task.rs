// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identity, description, and lifecycle state.

use crate::job::JobKey;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default failure budget when a task description does not set one.
pub const DEFAULT_MAX_TASK_FAILURES: u32 = 1;

/// Cluster-wide task identifier.
///
/// Ids are drawn from a single monotonically increasing counter owned by the
/// scheduler and seeded from the persisted snapshot, so an id is strictly
/// greater than every id assigned before it across the process lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Resources a task asks for, or a slave offers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Resources {
    pub cpus: f64,
    pub ram_mb: u64,
    pub disk_mb: u64,
}

impl Resources {
    pub fn new(cpus: f64, ram_mb: u64, disk_mb: u64) -> Self {
        Self { cpus, ram_mb, disk_mb }
    }

    /// Whether `ask` fits inside this offer.
    pub fn can_fit(&self, ask: &Resources) -> bool {
        self.cpus >= ask.cpus && self.ram_mb >= ask.ram_mb && self.disk_mb >= ask.disk_mb
    }
}

/// Slave-reported resource consumption. Volatile, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpus: f64,
    pub ram_mb: u64,
    pub disk_mb: u64,
}

/// Immutable description of one shard of a job.
///
/// The optional fields are inherited defaults: configuration population
/// fills each of them so that populated descriptions compare field-for-field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub start_command: String,
    pub resources: Resources,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_task_failures: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Replica index, unique within the job. Required after validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_id: Option<u32>,
}

impl TaskInfo {
    pub fn builder(start_command: impl Into<String>) -> TaskInfoBuilder {
        TaskInfoBuilder {
            start_command: start_command.into(),
            resources: Resources::new(1.0, 1024, 1024),
            ports: Vec::new(),
            daemon: None,
            max_task_failures: None,
            priority: None,
            shard_id: None,
        }
    }

    pub fn is_daemon(&self) -> bool {
        self.daemon.unwrap_or(false)
    }

    pub fn max_failures(&self) -> u32 {
        self.max_task_failures.unwrap_or(DEFAULT_MAX_TASK_FAILURES)
    }
}

pub struct TaskInfoBuilder {
    start_command: String,
    resources: Resources,
    ports: Vec<u16>,
    daemon: Option<bool>,
    max_task_failures: Option<u32>,
    priority: Option<i32>,
    shard_id: Option<u32>,
}

impl TaskInfoBuilder {
    crate::setters! {
        set {
            resources: Resources,
            ports: Vec<u16>,
        }
        option {
            daemon: bool,
            max_task_failures: u32,
            priority: i32,
            shard_id: u32,
        }
    }

    pub fn build(self) -> TaskInfo {
        TaskInfo {
            start_command: self.start_command,
            resources: self.resources,
            ports: self.ports,
            daemon: self.daemon,
            max_task_failures: self.max_task_failures,
            priority: self.priority,
            shard_id: self.shard_id,
        }
    }
}

/// The slave a task has been placed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaveRef {
    pub id: String,
    pub host: String,
}

impl SlaveRef {
    pub fn new(id: impl Into<String>, host: impl Into<String>) -> Self {
        Self { id: id.into(), host: host.into() }
    }
}

/// Lifecycle state of a task attempt.
///
/// One variant per state, carrying only the fields valid in that state:
/// a pending task has no slave; `Lost` and `KilledByClient` may be reached
/// from PENDING and then carry none either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskState {
    /// Waiting to be matched against an offer
    Pending,
    /// Launched on a slave, not yet confirmed running
    Starting { slave: SlaveRef },
    /// Confirmed running by the slave
    Running { slave: SlaveRef },
    /// Exited successfully (terminal)
    Finished { slave: SlaveRef },
    /// Exited with an error (terminal)
    Failed { slave: SlaveRef },
    /// Killed by the slave (terminal)
    Killed { slave: SlaveRef },
    /// Declared lost, usually after a slave stopped reporting it (terminal)
    Lost { slave: Option<SlaveRef> },
    /// Killed on explicit client request (terminal)
    KilledByClient { slave: Option<SlaveRef> },
}

crate::simple_display! {
    TaskState {
        Pending => "pending",
        Starting { .. } => "starting",
        Running { .. } => "running",
        Finished { .. } => "finished",
        Failed { .. } => "failed",
        Killed { .. } => "killed",
        Lost { .. } => "lost",
        KilledByClient { .. } => "killed_by_client",
    }
}

/// Tag-only variant of [`TaskState`] for queries, reports, and the
/// transition table (strips associated data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Starting,
    Running,
    Finished,
    Failed,
    Killed,
    Lost,
    KilledByClient,
}

impl TaskStatus {
    /// States an attempt can still make progress from.
    pub const ACTIVE: [TaskStatus; 3] =
        [TaskStatus::Pending, TaskStatus::Starting, TaskStatus::Running];

    /// States that admit no further transitions.
    pub const TERMINAL: [TaskStatus; 5] = [
        TaskStatus::Finished,
        TaskStatus::Failed,
        TaskStatus::Killed,
        TaskStatus::Lost,
        TaskStatus::KilledByClient,
    ];

    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Starting | TaskStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl From<&TaskState> for TaskStatus {
    fn from(s: &TaskState) -> Self {
        match s {
            TaskState::Pending => TaskStatus::Pending,
            TaskState::Starting { .. } => TaskStatus::Starting,
            TaskState::Running { .. } => TaskStatus::Running,
            TaskState::Finished { .. } => TaskStatus::Finished,
            TaskState::Failed { .. } => TaskStatus::Failed,
            TaskState::Killed { .. } => TaskStatus::Killed,
            TaskState::Lost { .. } => TaskStatus::Lost,
            TaskState::KilledByClient { .. } => TaskStatus::KilledByClient,
        }
    }
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        Starting => "starting",
        Running => "running",
        Finished => "finished",
        Failed => "failed",
        Killed => "killed",
        Lost => "lost",
        KilledByClient => "killed_by_client",
    }
}

/// A live record of one attempt to run one shard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub job: JobKey,
    pub shard: u32,
    /// The embedded description, with inherited fields populated.
    pub info: TaskInfo,
    pub state: TaskState,
    #[serde(default)]
    pub failures: u32,
    /// Prior attempt this task replaces, if it was rescheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestor: Option<TaskId>,
    /// Slave-reported consumption. Volatile.
    #[serde(skip)]
    pub usage: Option<ResourceUsage>,
    /// When the owning slave last mentioned this task. Volatile.
    #[serde(skip)]
    pub last_seen: Option<Instant>,
}

impl ScheduledTask {
    /// Create a fresh PENDING attempt for a shard.
    pub fn new(id: TaskId, job: JobKey, shard: u32, info: TaskInfo) -> Self {
        Self {
            id,
            job,
            shard,
            info,
            state: TaskState::Pending,
            failures: 0,
            ancestor: None,
            usage: None,
            last_seen: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus::from(&self.state)
    }

    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn slave(&self) -> Option<&SlaveRef> {
        match &self.state {
            TaskState::Pending => None,
            TaskState::Starting { slave }
            | TaskState::Running { slave }
            | TaskState::Finished { slave }
            | TaskState::Failed { slave }
            | TaskState::Killed { slave } => Some(slave),
            TaskState::Lost { slave } | TaskState::KilledByClient { slave } => slave.as_ref(),
        }
    }

    pub fn slave_host(&self) -> Option<&str> {
        self.slave().map(|s| s.host.as_str())
    }

    /// Build the replacement PENDING attempt for this (terminal) task.
    ///
    /// Preserves the shard, the embedded description, and the failure count;
    /// records this task as the replacement's ancestor.
    pub fn reschedule(&self, id: TaskId) -> ScheduledTask {
        ScheduledTask {
            id,
            job: self.job.clone(),
            shard: self.shard,
            info: self.info.clone(),
            state: TaskState::Pending,
            failures: self.failures,
            ancestor: Some(self.id),
            usage: None,
            last_seen: None,
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
