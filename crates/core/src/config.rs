// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job configuration validation and inherited-field population.

use crate::job::JobConfiguration;
use crate::task::DEFAULT_MAX_TASK_FAILURES;
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

/// Structural rejection of a submitted job configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskDescriptionError {
    #[error("job owner {0:?} is not a valid identifier")]
    InvalidOwner(String),
    #[error("job name {0:?} is not a valid identifier")]
    InvalidJobName(String),
    #[error("job has no tasks")]
    EmptyTaskSet,
    #[error("task at position {0} has no shard id")]
    MissingShardId(usize),
    #[error("shard id {0} appears more than once")]
    DuplicateShardId(u32),
    #[error("shard ids are not the contiguous range [0, {expected})")]
    NonContiguousShardIds { expected: u32 },
    #[error("shard {shard}: {field} must be positive")]
    NonPositiveValue { shard: u32, field: &'static str },
    #[error("shard {shard}: start command is empty")]
    EmptyStartCommand { shard: u32 },
    #[error("cron schedule {schedule:?} is unparsable: {reason}")]
    InvalidCronSchedule { schedule: String, reason: String },
}

/// Default priority when a task description does not set one.
const DEFAULT_PRIORITY: i32 = 0;

fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// Parse a cron schedule, accepting the classic five-field form.
///
/// The `cron` crate wants a seconds field; five-field expressions are
/// normalized by prepending one.
fn parse_cron_schedule(schedule: &str) -> Result<(), TaskDescriptionError> {
    let fields = schedule.split_whitespace().count();
    let normalized = if fields == 5 {
        format!("0 {schedule}")
    } else {
        schedule.to_string()
    };
    cron::Schedule::from_str(&normalized).map(|_| ()).map_err(|e| {
        TaskDescriptionError::InvalidCronSchedule {
            schedule: schedule.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Validate a submitted configuration and populate inherited task fields.
///
/// On success every optional field of every task description is filled with
/// its inherited default, so two populated configurations compare
/// field-for-field. The returned configuration is what the scheduler stores
/// and embeds into tasks.
pub fn validate_and_populate(
    mut job: JobConfiguration,
) -> Result<JobConfiguration, TaskDescriptionError> {
    if !is_valid_identifier(&job.key.owner) {
        return Err(TaskDescriptionError::InvalidOwner(job.key.owner));
    }
    if !is_valid_identifier(&job.key.name) {
        return Err(TaskDescriptionError::InvalidJobName(job.key.name));
    }
    if job.tasks.is_empty() {
        return Err(TaskDescriptionError::EmptyTaskSet);
    }

    let count = job.tasks.len() as u32;
    let mut seen = HashSet::new();
    for (position, task) in job.tasks.iter().enumerate() {
        let shard = task
            .shard_id
            .ok_or(TaskDescriptionError::MissingShardId(position))?;
        if !seen.insert(shard) {
            return Err(TaskDescriptionError::DuplicateShardId(shard));
        }
        if task.start_command.trim().is_empty() {
            return Err(TaskDescriptionError::EmptyStartCommand { shard });
        }
        if task.resources.cpus <= 0.0 {
            return Err(TaskDescriptionError::NonPositiveValue { shard, field: "cpus" });
        }
        if task.resources.ram_mb == 0 {
            return Err(TaskDescriptionError::NonPositiveValue { shard, field: "ram_mb" });
        }
        if task.resources.disk_mb == 0 {
            return Err(TaskDescriptionError::NonPositiveValue { shard, field: "disk_mb" });
        }
        if task.max_task_failures == Some(0) {
            return Err(TaskDescriptionError::NonPositiveValue {
                shard,
                field: "max_task_failures",
            });
        }
    }
    // Unique ids covering [0, N) are exactly the contiguous range.
    if seen.iter().any(|&s| s >= count) {
        return Err(TaskDescriptionError::NonContiguousShardIds { expected: count });
    }

    if let Some(schedule) = &job.cron_schedule {
        parse_cron_schedule(schedule)?;
        if job.cron_collision_policy.is_none() {
            job.cron_collision_policy = Some(Default::default());
        }
    }

    for task in &mut job.tasks {
        task.daemon.get_or_insert(false);
        task.max_task_failures.get_or_insert(DEFAULT_MAX_TASK_FAILURES);
        task.priority.get_or_insert(DEFAULT_PRIORITY);
    }

    Ok(job)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
