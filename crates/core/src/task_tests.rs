// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn info(shard: u32) -> TaskInfo {
    TaskInfo::builder("run-service").shard_id(shard).build()
}

fn task(id: u64) -> ScheduledTask {
    ScheduledTask::new(TaskId::new(id), JobKey::new("alice", "web"), 0, info(0))
}

#[test]
fn task_id_ordering_follows_value() {
    assert!(TaskId::new(2) > TaskId::new(1));
    assert_eq!(TaskId::new(7).to_string(), "7");
}

#[test]
fn task_id_serde_is_transparent() {
    let json = serde_json::to_string(&TaskId::new(42)).unwrap();
    assert_eq!(json, "42");
    let parsed: TaskId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, TaskId::new(42));
}

#[test]
fn resources_can_fit() {
    let offer = Resources::new(4.0, 4096, 8192);
    assert!(offer.can_fit(&Resources::new(1.0, 1024, 1024)));
    assert!(offer.can_fit(&Resources::new(4.0, 4096, 8192)));
    assert!(!offer.can_fit(&Resources::new(4.5, 1024, 1024)));
    assert!(!offer.can_fit(&Resources::new(1.0, 8192, 1024)));
}

#[test]
fn task_info_defaults() {
    let info = info(3);
    assert!(!info.is_daemon());
    assert_eq!(info.max_failures(), DEFAULT_MAX_TASK_FAILURES);
    assert_eq!(info.shard_id, Some(3));
}

#[test]
fn task_info_builder_sets_fields() {
    let info = TaskInfo::builder("serve")
        .resources(Resources::new(2.0, 2048, 512))
        .daemon(true)
        .max_task_failures(5u32)
        .priority(10)
        .shard_id(1u32)
        .build();
    assert!(info.is_daemon());
    assert_eq!(info.max_failures(), 5);
    assert_eq!(info.priority, Some(10));
    assert_eq!(info.resources.cpus, 2.0);
}

#[parameterized(
    pending = { TaskStatus::Pending, true },
    starting = { TaskStatus::Starting, true },
    running = { TaskStatus::Running, true },
    finished = { TaskStatus::Finished, false },
    failed = { TaskStatus::Failed, false },
    killed = { TaskStatus::Killed, false },
    lost = { TaskStatus::Lost, false },
    killed_by_client = { TaskStatus::KilledByClient, false },
)]
fn active_and_terminal_partition(status: TaskStatus, active: bool) {
    assert_eq!(status.is_active(), active);
    assert_eq!(status.is_terminal(), !active);
}

#[test]
fn state_to_status_strips_data() {
    let slave = SlaveRef::new("s1", "host1");
    assert_eq!(TaskStatus::from(&TaskState::Pending), TaskStatus::Pending);
    assert_eq!(
        TaskStatus::from(&TaskState::Running { slave: slave.clone() }),
        TaskStatus::Running
    );
    assert_eq!(
        TaskStatus::from(&TaskState::Lost { slave: None }),
        TaskStatus::Lost
    );
    assert_eq!(
        TaskStatus::from(&TaskState::KilledByClient { slave: Some(slave) }),
        TaskStatus::KilledByClient
    );
}

#[test]
fn slave_accessor_per_state() {
    let mut t = task(1);
    assert_eq!(t.slave_host(), None);

    t.state = TaskState::Starting { slave: SlaveRef::new("s1", "host1") };
    assert_eq!(t.slave_host(), Some("host1"));

    t.state = TaskState::Lost { slave: None };
    assert_eq!(t.slave_host(), None);
}

#[test]
fn reschedule_preserves_shard_and_failures() {
    let mut t = task(5);
    t.shard = 2;
    t.failures = 3;
    t.state = TaskState::Failed { slave: SlaveRef::new("s1", "host1") };

    let replacement = t.reschedule(TaskId::new(6));
    assert_eq!(replacement.id, TaskId::new(6));
    assert_eq!(replacement.ancestor, Some(TaskId::new(5)));
    assert_eq!(replacement.shard, 2);
    assert_eq!(replacement.failures, 3);
    assert_eq!(replacement.status(), TaskStatus::Pending);
    assert_eq!(replacement.job, t.job);
}

#[test]
fn volatile_fields_are_not_serialized() {
    let mut t = task(1);
    t.usage = Some(ResourceUsage { cpus: 0.5, ram_mb: 100, disk_mb: 10 });
    t.last_seen = Some(std::time::Instant::now());

    let json = serde_json::to_string(&t).unwrap();
    let parsed: ScheduledTask = serde_json::from_str(&json).unwrap();
    assert!(parsed.usage.is_none());
    assert!(parsed.last_seen.is_none());
    assert_eq!(parsed.id, t.id);
    assert_eq!(parsed.state, t.state);
}

#[test]
fn status_display() {
    assert_eq!(TaskStatus::KilledByClient.to_string(), "killed_by_client");
    assert_eq!(TaskState::Pending.to_string(), "pending");
}
