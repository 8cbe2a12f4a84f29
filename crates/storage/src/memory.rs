// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default [`Repository`] implementation: everything held in memory behind
//! a single lock, with optional JSON-snapshot durability to a file.

use crate::repository::Repository;
use crate::snapshot::{write_snapshot_atomically, RepositorySnapshot, CURRENT_SNAPSHOT_VERSION};
use crate::RepositoryError;
use chrono::Utc;
use orc_core::{Job, JobId, JobResult, JobStatus, Robot, RobotId, Schedule, ScheduleId, Trigger, TriggerId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, Job>,
    robots: HashMap<RobotId, Robot>,
    schedules: HashMap<ScheduleId, Schedule>,
    triggers: HashMap<TriggerId, Trigger>,
    results: Vec<JobResult>,
}

/// In-memory [`Repository`]. `snapshot_path` is optional — when set,
/// [`Repository::persist`] writes the whole state out atomically and
/// [`InMemoryRepository::load`] can reconstruct it at startup.
pub struct InMemoryRepository {
    inner: RwLock<Inner>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self { inner: RwLock::new(Inner::default()), snapshot_path: None }
    }

    pub fn with_snapshot_path(path: impl Into<PathBuf>) -> Self {
        Self { inner: RwLock::new(Inner::default()), snapshot_path: Some(path.into()) }
    }

    /// Reconstruct state from a snapshot file, if one exists at
    /// `snapshot_path`. Called once at startup (§6.3: "linearisable read
    /// for reconstruction at startup").
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let repo = Self { inner: RwLock::new(Inner::default()), snapshot_path: Some(path.clone()) };
        if !path.exists() {
            return Ok(repo);
        }
        let bytes = std::fs::read(&path)?;
        let snapshot: RepositorySnapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != CURRENT_SNAPSHOT_VERSION {
            return Err(RepositoryError::VersionMismatch {
                path: path.display().to_string(),
                found: snapshot.version,
                expected: CURRENT_SNAPSHOT_VERSION,
            });
        }
        let mut inner = repo.inner.write();
        inner.jobs = snapshot.jobs.into_iter().map(|j| (j.id, j)).collect();
        inner.robots = snapshot.robots.into_iter().map(|r| (r.id, r)).collect();
        inner.schedules = snapshot.schedules.into_iter().map(|s| (s.id, s)).collect();
        inner.triggers = snapshot.triggers.into_iter().map(|t| (t.id, t)).collect();
        inner.results = snapshot.results;
        drop(inner);
        Ok(repo)
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for InMemoryRepository {
    fn put_job(&self, job: Job) {
        self.inner.write().jobs.insert(job.id, job);
    }

    fn get_job(&self, id: JobId) -> Option<Job> {
        self.inner.read().jobs.get(&id).cloned()
    }

    fn remove_job(&self, id: JobId) -> Option<Job> {
        self.inner.write().jobs.remove(&id)
    }

    fn all_jobs(&self) -> Vec<Job> {
        self.inner.read().jobs.values().cloned().collect()
    }

    fn jobs_by_status(&self, status: JobStatus) -> Vec<Job> {
        self.inner.read().jobs.values().filter(|j| j.status == status).cloned().collect()
    }

    fn jobs_by_robot(&self, robot_id: RobotId) -> Vec<Job> {
        self.inner.read().jobs.values().filter(|j| j.assigned_robot_id == Some(robot_id)).cloned().collect()
    }

    fn jobs_by_workflow(&self, workflow_id: &str) -> Vec<Job> {
        self.inner.read().jobs.values().filter(|j| j.workflow_id == workflow_id).cloned().collect()
    }

    fn put_robot(&self, robot: Robot) {
        self.inner.write().robots.insert(robot.id, robot);
    }

    fn get_robot(&self, id: RobotId) -> Option<Robot> {
        self.inner.read().robots.get(&id).cloned()
    }

    fn remove_robot(&self, id: RobotId) -> Option<Robot> {
        self.inner.write().robots.remove(&id)
    }

    fn all_robots(&self) -> Vec<Robot> {
        self.inner.read().robots.values().cloned().collect()
    }

    fn put_schedule(&self, schedule: Schedule) {
        self.inner.write().schedules.insert(schedule.id, schedule);
    }

    fn get_schedule(&self, id: ScheduleId) -> Option<Schedule> {
        self.inner.read().schedules.get(&id).cloned()
    }

    fn remove_schedule(&self, id: ScheduleId) -> Option<Schedule> {
        self.inner.write().schedules.remove(&id)
    }

    fn all_schedules(&self) -> Vec<Schedule> {
        self.inner.read().schedules.values().cloned().collect()
    }

    fn put_trigger(&self, trigger: Trigger) {
        self.inner.write().triggers.insert(trigger.id, trigger);
    }

    fn get_trigger(&self, id: TriggerId) -> Option<Trigger> {
        self.inner.read().triggers.get(&id).cloned()
    }

    fn remove_trigger(&self, id: TriggerId) -> Option<Trigger> {
        self.inner.write().triggers.remove(&id)
    }

    fn all_triggers(&self) -> Vec<Trigger> {
        self.inner.read().triggers.values().cloned().collect()
    }

    fn put_result(&self, result: JobResult) {
        self.inner.write().results.push(result);
    }

    fn results_by_workflow(&self, workflow_id: &str) -> Vec<JobResult> {
        self.inner.read().results.iter().filter(|r| r.workflow_id == workflow_id).cloned().collect()
    }

    fn results_by_robot(&self, robot_id: RobotId) -> Vec<JobResult> {
        self.inner.read().results.iter().filter(|r| r.robot_id == Some(robot_id)).cloned().collect()
    }

    fn persist(&self) -> Result<(), RepositoryError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let inner = self.inner.read();
        let snapshot = RepositorySnapshot {
            version: CURRENT_SNAPSHOT_VERSION,
            created_at: Utc::now(),
            jobs: inner.jobs.values().cloned().collect(),
            robots: inner.robots.values().cloned().collect(),
            schedules: inner.schedules.values().cloned().collect(),
            triggers: inner.triggers.values().cloned().collect(),
            results: inner.results.clone(),
        };
        drop(inner);
        write_snapshot_atomically(path, &snapshot)?;
        tracing::debug!(path = %path.display(), "repository snapshot persisted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
