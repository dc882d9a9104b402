// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource offers and the pluggable placement predicate.

use herd_core::{Resources, ScheduledTask, TaskId, TaskInfo};

/// A resource advertisement from a slave node.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub slave_id: String,
    pub slave_host: String,
    pub resources: Resources,
    pub ports: Vec<u16>,
}

impl Offer {
    pub fn new(
        slave_id: impl Into<String>,
        slave_host: impl Into<String>,
        resources: Resources,
    ) -> Self {
        Self {
            slave_id: slave_id.into(),
            slave_host: slave_host.into(),
            resources,
            ports: Vec::new(),
        }
    }

    pub fn ports(mut self, ports: Vec<u16>) -> Self {
        self.ports = ports;
        self
    }
}

/// The launch descriptor returned when an offer is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskAssignment {
    pub task_id: TaskId,
    pub slave_id: String,
    pub slave_host: String,
    pub task: TaskInfo,
}

/// Produces a per-offer predicate indicating which pending tasks may be
/// placed on the offering slave.
pub trait SchedulingFilter: Send + Sync {
    fn make_filter<'a>(&'a self, offer: &'a Offer) -> Box<dyn Fn(&ScheduledTask) -> bool + 'a>;
}

/// Default policy: a task fits wherever its resource and port asks are
/// covered by the offer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceFilter;

impl SchedulingFilter for ResourceFilter {
    fn make_filter<'a>(&'a self, offer: &'a Offer) -> Box<dyn Fn(&ScheduledTask) -> bool + 'a> {
        Box::new(|task| {
            offer.resources.can_fit(&task.info.resources)
                && offer.ports.len() >= task.info.ports.len()
        })
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
