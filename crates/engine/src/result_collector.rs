// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The result collector (§4.7): records terminal job outcomes and
//! maintains incremental per-workflow / per-robot statistics.

use orc_core::{
    Clock, Job, JobResult, JobStatus, RobotId, Statistics, StatisticsSnapshot, TerminalStatus, DEFAULT_STATS_WINDOW,
};
use orc_storage::Repository;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub struct ResultCollector<C: Clock> {
    repo: Arc<dyn Repository>,
    clock: C,
    per_workflow: RwLock<HashMap<String, Statistics>>,
    per_robot: RwLock<HashMap<RobotId, Statistics>>,
}

impl<C: Clock> ResultCollector<C> {
    pub fn new(repo: Arc<dyn Repository>, clock: C) -> Self {
        Self { repo, clock, per_workflow: RwLock::new(HashMap::new()), per_robot: RwLock::new(HashMap::new()) }
    }

    /// Record a job that just reached a terminal status. No-op if `job` is
    /// not terminal (callers only pass jobs returned from a queue
    /// transition, so this should never trip in practice).
    pub fn record(&self, job: &Job, logs: Vec<String>) -> Option<JobResult> {
        let terminal_status: Option<TerminalStatus> = job.status.into();
        let terminal_status = terminal_status?;

        let result = JobResult::new(
            job.id,
            job.workflow_id.clone(),
            job.assigned_robot_id,
            terminal_status,
            job.started_at,
            job.queued_at,
            job.completed_at.unwrap_or_else(|| self.clock.utc_now()),
            job.result.clone(),
            job.error.clone(),
            logs,
        );

        self.per_workflow
            .write()
            .entry(job.workflow_id.clone())
            .or_insert_with(|| Statistics::new(DEFAULT_STATS_WINDOW))
            .record(terminal_status, result.duration_ms);

        if let Some(robot_id) = job.assigned_robot_id {
            self.per_robot
                .write()
                .entry(robot_id)
                .or_insert_with(|| Statistics::new(DEFAULT_STATS_WINDOW))
                .record(terminal_status, result.duration_ms);
        }

        self.repo.put_result(result.clone());
        Some(result)
    }

    pub fn workflow_stats(&self, workflow_id: &str) -> Option<StatisticsSnapshot> {
        self.per_workflow.read().get(workflow_id).map(Statistics::snapshot)
    }

    pub fn robot_stats(&self, robot_id: RobotId) -> Option<StatisticsSnapshot> {
        self.per_robot.read().get(&robot_id).map(Statistics::snapshot)
    }

    pub fn all_workflow_stats(&self) -> HashMap<String, StatisticsSnapshot> {
        self.per_workflow.read().iter().map(|(k, v)| (k.clone(), v.snapshot())).collect()
    }

    pub fn all_robot_stats(&self) -> HashMap<RobotId, StatisticsSnapshot> {
        self.per_robot.read().iter().map(|(k, v)| (*k, v.snapshot())).collect()
    }
}

#[cfg(test)]
#[path = "result_collector_tests.rs"]
mod tests;
