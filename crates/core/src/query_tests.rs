// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::task::{ScheduledTask, SlaveRef, TaskInfo, TaskState};

fn task(id: u64, owner: &str, job: &str) -> ScheduledTask {
    ScheduledTask::new(
        TaskId::new(id),
        JobKey::new(owner, job),
        0,
        TaskInfo::builder("run").shard_id(0u32).build(),
    )
}

#[test]
fn empty_query_matches_everything() {
    assert!(TaskQuery::all().matches(&task(1, "alice", "web")));
}

#[test]
fn owner_and_job_name_are_conjoined() {
    let q = TaskQuery::by_job(&JobKey::new("alice", "web"));
    assert!(q.matches(&task(1, "alice", "web")));
    assert!(!q.matches(&task(1, "alice", "db")));
    assert!(!q.matches(&task(1, "bob", "web")));
}

#[test]
fn id_set_selects_members() {
    let q = TaskQuery::by_ids([TaskId::new(1), TaskId::new(3)]);
    assert!(q.matches(&task(1, "alice", "web")));
    assert!(!q.matches(&task(2, "alice", "web")));
    assert!(q.matches(&task(3, "alice", "web")));
}

#[test]
fn status_set_selects_members() {
    let mut running = task(1, "alice", "web");
    running.state = TaskState::Running { slave: SlaveRef::new("s1", "host1") };

    let q = TaskQuery::by_status(TaskStatus::Pending);
    assert!(q.matches(&task(2, "alice", "web")));
    assert!(!q.matches(&running));
}

#[test]
fn active_query_excludes_terminal_states() {
    let key = JobKey::new("alice", "web");
    let q = TaskQuery::active(&key);

    let pending = task(1, "alice", "web");
    assert!(q.matches(&pending));

    let mut lost = task(2, "alice", "web");
    lost.state = TaskState::Lost { slave: None };
    assert!(!q.matches(&lost));

    // Right status, wrong job
    assert!(!q.matches(&task(3, "alice", "db")));
}

#[test]
fn predicate_is_the_final_stage() {
    let q = TaskQuery::all()
        .owner("alice")
        .predicate(|t| t.shard == 1);

    let mut t = task(1, "alice", "web");
    assert!(!q.matches(&t));
    t.shard = 1;
    assert!(q.matches(&t));
}

#[test]
fn debug_omits_predicate_body() {
    let q = TaskQuery::all().predicate(|_| true);
    let rendered = format!("{q:?}");
    assert!(rendered.contains("<fn>"));
}
