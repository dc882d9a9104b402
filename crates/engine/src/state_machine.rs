// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The canonical status-transition table for a task.
//!
//! A transition either applies, mutating the task in place and returning
//! the follow-up work as data, or is rejected and leaves the task
//! untouched. Rejections are logged and swallowed: stale and duplicate
//! reports are routine in a cluster and must not destabilize the scheduler.
//! The effects are values (not calls) so the core can run them after the
//! store mutation completes.

use herd_core::{ScheduledTask, SlaveRef, TaskId, TaskState, TaskStatus};
use tracing::{debug, warn};

/// Follow-up work a transition asks the core to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TaskEffect {
    /// Create a replacement PENDING attempt for the (now terminal) task.
    Reschedule { ancestor: TaskId },
    /// Enqueue a driver kill for the task.
    KillViaDriver { task: TaskId },
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    Applied { effects: Vec<TaskEffect> },
    Rejected,
}

/// Drive one task toward `target`.
///
/// `slave` is only consulted for PENDING → STARTING (the launch records the
/// placement); every other transition reuses the placement already carried
/// by the task's state.
pub(crate) fn apply(
    task: &mut ScheduledTask,
    target: TaskStatus,
    slave: Option<SlaveRef>,
) -> Transition {
    let from = task.status();
    if from.is_terminal() {
        warn!(task = %task.id, %from, %target, "transition out of terminal state rejected");
        return Transition::Rejected;
    }
    if from == target {
        debug!(task = %task.id, %from, "duplicate status report ignored");
        return Transition::Rejected;
    }

    let id = task.id;
    let (next, effects, count_failure) = match (&task.state, target) {
        (TaskState::Pending, TaskStatus::Starting) => match slave {
            Some(slave) => (TaskState::Starting { slave }, vec![], false),
            None => {
                warn!(task = %id, "launch without a slave assignment rejected");
                return Transition::Rejected;
            }
        },
        (TaskState::Pending, TaskStatus::Lost) => (
            TaskState::Lost { slave: None },
            vec![TaskEffect::Reschedule { ancestor: id }],
            false,
        ),
        // Nothing is running yet, so there is no driver kill to enqueue.
        (TaskState::Pending, TaskStatus::KilledByClient) => {
            (TaskState::KilledByClient { slave: None }, vec![], false)
        }

        (TaskState::Starting { slave }, TaskStatus::Running) => {
            (TaskState::Running { slave: slave.clone() }, vec![], false)
        }

        (
            TaskState::Starting { slave } | TaskState::Running { slave },
            TaskStatus::Finished,
        ) => {
            let effects = if task.info.is_daemon() {
                vec![TaskEffect::Reschedule { ancestor: id }]
            } else {
                vec![]
            };
            (TaskState::Finished { slave: slave.clone() }, effects, false)
        }

        (TaskState::Starting { slave } | TaskState::Running { slave }, TaskStatus::Failed) => {
            let effects = if task.failures + 1 < task.info.max_failures() {
                vec![TaskEffect::Reschedule { ancestor: id }]
            } else {
                vec![]
            };
            (TaskState::Failed { slave: slave.clone() }, effects, true)
        }

        (TaskState::Starting { slave } | TaskState::Running { slave }, TaskStatus::Killed) => {
            (TaskState::Killed { slave: slave.clone() }, vec![], false)
        }

        // A lost slave is not the task's fault: reschedule without touching
        // the failure budget.
        (TaskState::Starting { slave } | TaskState::Running { slave }, TaskStatus::Lost) => (
            TaskState::Lost { slave: Some(slave.clone()) },
            vec![TaskEffect::Reschedule { ancestor: id }],
            false,
        ),

        (
            TaskState::Starting { slave } | TaskState::Running { slave },
            TaskStatus::KilledByClient,
        ) => (
            TaskState::KilledByClient { slave: Some(slave.clone()) },
            vec![TaskEffect::KillViaDriver { task: id }],
            false,
        ),

        (_, target) => {
            warn!(task = %id, %from, %target, "invalid transition rejected");
            return Transition::Rejected;
        }
    };

    task.state = next;
    if count_failure {
        task.failures += 1;
    }
    debug!(task = %id, %from, %target, failures = task.failures, "transition applied");
    Transition::Applied { effects }
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
