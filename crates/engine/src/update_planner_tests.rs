// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::ScheduleError;
use crate::test_support::{job, offer, setup};
use herd_core::JobKey;

fn job_with_priority(owner: &str, name: &str, shards: u32, priority: i32) -> JobConfiguration {
    JobConfiguration::builder(owner, name)
        .tasks(
            (0..shards)
                .map(|i| TaskInfo::builder("run-service").priority(priority).shard_id(i).build())
                .collect(),
        )
        .build()
}

fn job_with_command(owner: &str, name: &str, command: &str) -> JobConfiguration {
    JobConfiguration::builder(owner, name)
        .task(TaskInfo::builder(command).shard_id(0u32).build())
        .build()
}

#[test]
fn update_of_unknown_job_fails() {
    let ctx = setup();
    let err = ctx.scheduler.update_job(job("alice", "web", 1)).unwrap_err();
    assert!(matches!(err, ScheduleError::JobNotFound(key) if key == JobKey::new("alice", "web")));
}

#[test]
fn identical_config_is_a_no_op() {
    let ctx = setup();
    ctx.scheduler.create_job(job("alice", "web", 2)).unwrap();
    let result = ctx.scheduler.update_job(job("alice", "web", 2)).unwrap();
    assert_eq!(result, JobUpdateResult::JobUnchanged);
}

#[test]
fn priority_change_applies_in_place() {
    let ctx = setup();
    ctx.scheduler.create_job(job("alice", "web", 2)).unwrap();
    let assignment = ctx.scheduler.offer(&offer("host1")).unwrap();
    ctx.report("host1", &[(assignment.task_id, TaskStatus::Running)]);

    let result = ctx.scheduler.update_job(job_with_priority("alice", "web", 2, 10)).unwrap();
    assert_eq!(result, JobUpdateResult::Completed);
    assert!(ctx.launcher.launches().is_empty());

    // The running task kept its status and carries the new description
    let task = &ctx.scheduler.get_tasks(&TaskQuery::by_id(assignment.task_id))[0];
    assert_eq!(task.status(), TaskStatus::Running);
    assert_eq!(task.info.priority, Some(10));

    for task in ctx.scheduler.get_tasks(&TaskQuery::by_job(&JobKey::new("alice", "web"))) {
        assert_eq!(task.info.priority, Some(10));
    }
}

#[test]
fn command_change_launches_the_updater() {
    let ctx = setup();
    ctx.scheduler.create_job(job_with_command("alice", "web", "run-v1")).unwrap();

    let result = ctx.scheduler.update_job(job_with_command("alice", "web", "run-v2")).unwrap();
    assert_eq!(result, JobUpdateResult::UpdaterLaunched);

    let launches = ctx.launcher.launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].tasks[0].start_command, "run-v2");

    // The stored task was not touched
    let tasks = ctx.scheduler.get_tasks(&TaskQuery::by_job(&JobKey::new("alice", "web")));
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].info.start_command, "run-v1");
}

#[test]
fn growing_the_shard_set_adds_pending_tasks() {
    let ctx = setup();
    ctx.scheduler.create_job(job("alice", "web", 2)).unwrap();

    let result = ctx.scheduler.update_job(job("alice", "web", 4)).unwrap();
    assert_eq!(result, JobUpdateResult::Completed);

    let tasks = ctx.scheduler.get_tasks(&TaskQuery::active(&JobKey::new("alice", "web")));
    assert_eq!(tasks.len(), 4);
    let shards: Vec<u32> = tasks.iter().map(|t| t.shard).collect();
    assert_eq!(shards, vec![0, 1, 2, 3]);
    // Added shards are fresh attempts, not reschedules
    assert!(tasks.iter().all(|t| t.ancestor.is_none()));
}

#[test]
fn shrinking_the_shard_set_kills_excess_tasks() {
    let mut ctx = setup();
    ctx.scheduler.create_job(job("alice", "web", 3)).unwrap();
    // Place shard 0; shards 1 and 2 stay pending
    let placed = ctx.scheduler.offer(&offer("host1")).unwrap();
    ctx.report("host1", &[(placed.task_id, TaskStatus::Running)]);

    let result = ctx.scheduler.update_job(job("alice", "web", 1)).unwrap();
    assert_eq!(result, JobUpdateResult::Completed);

    let active = ctx.scheduler.get_tasks(&TaskQuery::active(&JobKey::new("alice", "web")));
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].shard, 0);
    // Pending excess shards were deleted outright, so no driver kills
    assert_eq!(ctx.drain_work(), 0);
}

#[test]
fn shrinking_kills_placed_excess_through_the_driver() {
    let mut ctx = setup();
    ctx.scheduler.create_job(job("alice", "web", 2)).unwrap();
    let s0 = ctx.scheduler.offer(&offer("host1")).unwrap();
    let s1 = ctx.scheduler.offer(&offer("host2")).unwrap();
    ctx.report("host1", &[(s0.task_id, TaskStatus::Running)]);
    ctx.report("host2", &[(s1.task_id, TaskStatus::Running)]);

    let result = ctx.scheduler.update_job(job("alice", "web", 1)).unwrap();
    assert_eq!(result, JobUpdateResult::Completed);

    let excess = &ctx.scheduler.get_tasks(&TaskQuery::by_id(s1.task_id))[0];
    assert_eq!(excess.status(), TaskStatus::KilledByClient);
    ctx.drain_work();
    assert_eq!(ctx.driver.kills(), vec![s1.task_id]);
}

#[test]
fn terminal_shard_is_reincarnated_without_ancestor() {
    let ctx = setup();
    ctx.scheduler.create_job(job("alice", "web", 1)).unwrap();
    let placed = ctx.scheduler.offer(&offer("host1")).unwrap();
    ctx.report("host1", &[(placed.task_id, TaskStatus::Running)]);
    ctx.report("host1", &[(placed.task_id, TaskStatus::Finished)]);

    let result = ctx.scheduler.update_job(job_with_priority("alice", "web", 1, 5)).unwrap();
    assert_eq!(result, JobUpdateResult::Completed);

    let pending = ctx.scheduler.get_tasks(&TaskQuery::by_status(TaskStatus::Pending));
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].shard, 0);
    assert!(pending[0].ancestor.is_none());
    assert_eq!(pending[0].info.priority, Some(5));
}

#[test]
fn cron_update_swaps_the_stored_schedule() {
    let ctx = setup();
    let original = JobConfiguration::builder("alice", "nightly")
        .task(TaskInfo::builder("report").shard_id(0u32).build())
        .cron_schedule("1 1 1 1 1")
        .build();
    ctx.scheduler.create_job(original.clone()).unwrap();

    // Unchanged cron config
    let result = ctx.scheduler.update_job(original).unwrap();
    assert_eq!(result, JobUpdateResult::JobUnchangedCron);

    // New schedule
    let changed = JobConfiguration::builder("alice", "nightly")
        .task(TaskInfo::builder("report").shard_id(0u32).build())
        .cron_schedule("* * * * 1")
        .build();
    let result = ctx.scheduler.update_job(changed).unwrap();
    assert_eq!(result, JobUpdateResult::Completed);

    let stored = &ctx.scheduler.jobs()[0];
    assert_eq!(stored.cron_schedule.as_deref(), Some("* * * * 1"));
}
