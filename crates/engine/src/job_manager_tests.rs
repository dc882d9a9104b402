// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{job, shard};
use herd_core::{validate_and_populate, TaskQuery, TaskStatus};

fn populated(job: herd_core::JobConfiguration) -> herd_core::JobConfiguration {
    validate_and_populate(job).unwrap()
}

fn cron_job(owner: &str, name: &str) -> herd_core::JobConfiguration {
    populated(
        herd_core::JobConfiguration::builder(owner, name)
            .task(shard(0))
            .cron_schedule("0 3 * * *")
            .build(),
    )
}

#[test]
fn factory_materializes_one_pending_task_per_shard() {
    let mut store = TaskStore::new();
    let mut counter = 0;
    let created = TaskFactory::new(&mut store, &mut counter)
        .materialize(&populated(job("alice", "web", 3)))
        .unwrap();

    assert_eq!(created.len(), 3);
    assert_eq!(counter, 3);
    let tasks = store.fetch(&TaskQuery::all());
    assert_eq!(tasks.len(), 3);
    for (i, task) in tasks.iter().enumerate() {
        assert_eq!(task.status(), TaskStatus::Pending);
        assert_eq!(task.shard, i as u32);
        assert_eq!(task.id, TaskId::new(i as u64 + 1));
        assert!(task.ancestor.is_none());
    }
}

#[test]
fn factory_ids_keep_climbing_across_jobs() {
    let mut store = TaskStore::new();
    let mut counter = 0;
    {
        let mut factory = TaskFactory::new(&mut store, &mut counter);
        factory.materialize(&populated(job("alice", "web", 2))).unwrap();
        factory.materialize(&populated(job("bob", "db", 2))).unwrap();
    }
    let ids: Vec<u64> = store.fetch(&TaskQuery::all()).iter().map(|t| t.id.value()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[test]
fn immediate_manager_declines_cron_jobs() {
    let mut store = TaskStore::new();
    let mut counter = 0;
    let mut manager = ImmediateJobManager;
    let accepted = manager
        .receive_job(&mut TaskFactory::new(&mut store, &mut counter), &cron_job("alice", "nightly"))
        .unwrap();
    assert!(accepted.is_none());
    assert!(store.is_empty());
}

#[test]
fn immediate_manager_accepts_and_materializes() {
    let mut store = TaskStore::new();
    let mut counter = 0;
    let mut manager = ImmediateJobManager;
    let accepted = manager
        .receive_job(&mut TaskFactory::new(&mut store, &mut counter), &populated(job("alice", "web", 2)))
        .unwrap();
    assert_eq!(accepted.map(|ids| ids.len()), Some(2));
    assert!(manager.has_job(&store, &JobKey::new("alice", "web")));
    assert!(!manager.has_job(&store, &JobKey::new("alice", "db")));
}

#[test]
fn cron_manager_stores_without_materializing() {
    let mut store = TaskStore::new();
    let mut counter = 0;
    let mut manager = CronJobManager::default();
    let job = cron_job("alice", "nightly");
    let accepted = manager
        .receive_job(&mut TaskFactory::new(&mut store, &mut counter), &job)
        .unwrap();
    assert_eq!(accepted, Some(Vec::new()));
    assert!(store.is_empty());
    assert!(manager.has_job(&store, &job.key));
    assert_eq!(manager.get(&job.key), Some(&job));
}

#[test]
fn cron_manager_declines_jobs_without_schedule() {
    let mut store = TaskStore::new();
    let mut counter = 0;
    let mut manager = CronJobManager::default();
    let accepted = manager
        .receive_job(&mut TaskFactory::new(&mut store, &mut counter), &populated(job("alice", "web", 1)))
        .unwrap();
    assert!(accepted.is_none());
}

#[test]
fn cron_manager_delete_removes_definition() {
    let mut store = TaskStore::new();
    let mut counter = 0;
    let mut manager = CronJobManager::default();
    let job = cron_job("alice", "nightly");
    manager
        .receive_job(&mut TaskFactory::new(&mut store, &mut counter), &job)
        .unwrap();

    assert!(manager.delete_job(&job.key));
    assert!(!manager.has_job(&store, &job.key));
    // Second delete is a no-op
    assert!(!manager.delete_job(&job.key));
}

#[test]
fn cron_manager_round_trips_through_configs() {
    let mut manager = CronJobManager::default();
    manager.replace(cron_job("alice", "nightly"));
    manager.replace(cron_job("bob", "weekly"));

    let configs: Vec<_> = manager.configs().cloned().collect();
    let rebuilt = CronJobManager::from_configs(configs);
    assert!(rebuilt.get(&JobKey::new("alice", "nightly")).is_some());
    assert!(rebuilt.get(&JobKey::new("bob", "weekly")).is_some());
}
