// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The priority queue (§4.1): the set of jobs in every non-terminal
//! state, deduplication, state-machine enforcement, and timeout detection.

use crate::EngineError;
use chrono::{DateTime, Utc};
use orc_core::{Clock, Job, JobId, JobSpec, JobStatus, RobotId, ScheduleId, ValidationError};
use orc_storage::Repository;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of a cancel request (§4.4).
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    /// PENDING/QUEUED job cancelled immediately.
    Cancelled(Job),
    /// RUNNING job: a `JobCancel` must be sent to the robot; the caller
    /// (engine) completes the cancellation via [`Queue::force_cancel_running`]
    /// once the robot acknowledges or the grace period elapses.
    AwaitingRobotAck(Job),
}

struct QueueState {
    /// Every job in PENDING, QUEUED, or RUNNING.
    jobs: HashMap<JobId, Job>,
    /// (workflow_id, dedup_key) -> (job_id, submitted_at). Retained for the
    /// dedup window even after the job referenced goes terminal and is
    /// evicted from `jobs`.
    dedup_index: HashMap<(String, String), (JobId, DateTime<Utc>)>,
}

pub struct Queue<C: Clock> {
    state: Mutex<QueueState>,
    repo: Arc<dyn Repository>,
    clock: C,
    dedup_window: chrono::Duration,
    max_queue_depth: usize,
}

impl<C: Clock> Queue<C> {
    pub fn new(repo: Arc<dyn Repository>, clock: C, dedup_window: chrono::Duration, max_queue_depth: usize) -> Self {
        let jobs: HashMap<JobId, Job> = repo
            .all_jobs()
            .into_iter()
            .filter(|j| !j.is_terminal())
            .map(|j| (j.id, j))
            .collect();
        Self { state: Mutex::new(QueueState { jobs, dedup_index: HashMap::new() }), repo, clock, dedup_window, max_queue_depth }
    }

    /// Validate, deduplicate, and enqueue a job. Returns the existing
    /// `job_id` unchanged if an equivalent submission is still within the
    /// dedup window (§8 idempotence law).
    pub fn submit(
        &self,
        spec: JobSpec,
        dedup_key: Option<String>,
        check_duplicate: bool,
        schedule_id: Option<ScheduleId>,
    ) -> Result<JobId, EngineError> {
        self.submit_inner(spec, dedup_key, check_duplicate, schedule_id, 0)
    }

    /// `RetryJob` (§6.1): resubmit with the same payload under a fresh
    /// `job_id`, carrying `retry_count` forward from the original job.
    pub fn submit_retry(&self, spec: JobSpec, retry_count: u32) -> Result<JobId, EngineError> {
        self.submit_inner(spec, None, false, None, retry_count)
    }

    fn submit_inner(
        &self,
        spec: JobSpec,
        dedup_key: Option<String>,
        check_duplicate: bool,
        schedule_id: Option<ScheduleId>,
        retry_count: u32,
    ) -> Result<JobId, EngineError> {
        if spec.workflow_id.trim().is_empty() {
            return Err(EngineError::Validation(ValidationError::EmptyWorkflowId));
        }
        if spec.timeout_secs == 0 {
            return Err(EngineError::Validation(ValidationError::ZeroTimeout));
        }

        let now = self.clock.utc_now();
        let mut state = self.state.lock();

        if check_duplicate {
            if let Some(key) = &dedup_key {
                let dedup_entry = state.dedup_index.get(&(spec.workflow_id.clone(), key.clone())).copied();
                if let Some((existing_id, submitted_at)) = dedup_entry {
                    if now.signed_duration_since(submitted_at) <= self.dedup_window {
                        return Ok(existing_id);
                    }
                }
            }
        }

        if state.jobs.len() >= self.max_queue_depth {
            return Err(EngineError::QueueFull(self.max_queue_depth));
        }

        let mut job = Job::new(JobId::new(), spec, &self.clock);
        job.dedup_key = dedup_key.clone();
        job.schedule_id = schedule_id;
        job.retry_count = retry_count;
        job.transition_to(JobStatus::Queued, &self.clock)?;
        let job_id = job.id;

        if let Some(key) = dedup_key {
            state.dedup_index.insert((job.workflow_id.clone(), key), (job_id, now));
        }
        state.jobs.insert(job_id, job.clone());
        drop(state);
        self.repo.put_job(job);
        Ok(job_id)
    }

    /// Jobs currently QUEUED and past their `scheduled_time`, sorted in
    /// dispatch order: priority descending, then `queued_at` ascending,
    /// ties broken by lexicographic `job_id`.
    pub fn queued_snapshot(&self) -> Vec<Job> {
        let state = self.state.lock();
        let now = self.clock.utc_now();
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Queued && j.is_eligible_by_time(now))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.queued_at.cmp(&b.queued_at)).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    /// Atomically assign a still-QUEUED job to a robot. Returns `None` if
    /// another dispatch tick already claimed it.
    pub fn try_dequeue(&self, job_id: JobId, robot_id: RobotId) -> Option<Job> {
        let mut state = self.state.lock();
        let job = state.jobs.get_mut(&job_id)?;
        if job.status != JobStatus::Queued {
            return None;
        }
        job.assign(robot_id, &self.clock).ok()?;
        let snapshot = job.clone();
        drop(state);
        self.repo.put_job(snapshot.clone());
        Some(snapshot)
    }

    pub fn get(&self, job_id: JobId) -> Option<Job> {
        self.state.lock().jobs.get(&job_id).cloned().or_else(|| self.repo.get_job(job_id))
    }

    /// `JobReject` / robot-loss recovery: RUNNING -> QUEUED, `retry_count++`.
    pub fn requeue_from_running(&self, job_id: JobId) -> Option<Job> {
        let mut state = self.state.lock();
        let job = state.jobs.get_mut(&job_id)?;
        job.requeue_from_running(&self.clock).ok()?;
        let snapshot = job.clone();
        drop(state);
        self.repo.put_job(snapshot.clone());
        Some(snapshot)
    }

    pub fn update_progress(&self, job_id: JobId, pct: u8, current_node: Option<String>) -> bool {
        let mut state = self.state.lock();
        let Some(job) = state.jobs.get_mut(&job_id) else { return false };
        let applied = job.update_progress(pct, current_node, &self.clock);
        if applied {
            let snapshot = job.clone();
            drop(state);
            self.repo.put_job(snapshot);
        }
        applied
    }

    /// Only a job currently RUNNING and assigned to `reporter` transitions
    /// (§4.4 idempotent completion check). Returns `None` for a stale
    /// report, which callers log and discard.
    fn complete_running(&self, job_id: JobId, reporter: RobotId, to: JobStatus) -> Option<Job> {
        let mut state = self.state.lock();
        let job = state.jobs.get_mut(&job_id)?;
        if job.status != JobStatus::Running || job.assigned_robot_id != Some(reporter) {
            return None;
        }
        job.transition_to(to, &self.clock).ok()?;
        let snapshot = job.clone();
        state.jobs.remove(&job_id);
        drop(state);
        self.repo.put_job(snapshot.clone());
        Some(snapshot)
    }

    pub fn complete(&self, job_id: JobId, reporter: RobotId, result: serde_json::Value) -> Option<Job> {
        let job = self.complete_running(job_id, reporter, JobStatus::Completed)?;
        let mut job = job;
        job.result = Some(result);
        self.repo.put_job(job.clone());
        Some(job)
    }

    pub fn fail(&self, job_id: JobId, reporter: RobotId, error: orc_core::JobError) -> Option<Job> {
        let job = self.complete_running(job_id, reporter, JobStatus::Failed)?;
        let mut job = job;
        job.error = Some(error);
        self.repo.put_job(job.clone());
        Some(job)
    }

    /// Mark every RUNNING job whose lease has expired as TIMEOUT.
    pub fn sweep_timeouts(&self) -> Vec<Job> {
        let now = self.clock.utc_now();
        let mut state = self.state.lock();
        let expired: Vec<JobId> =
            state.jobs.values().filter(|j| j.lease_expired(now)).map(|j| j.id).collect();

        let mut timed_out = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(job) = state.jobs.get_mut(&id) {
                if job.transition_to(JobStatus::Timeout, &self.clock).is_ok() {
                    job.error = Some(orc_core::JobError::new(orc_core::ErrorKind::Timeout, "job exceeded its timeout"));
                    let snapshot = job.clone();
                    state.jobs.remove(&id);
                    timed_out.push(snapshot);
                }
            }
        }
        drop(state);
        for job in &timed_out {
            self.repo.put_job(job.clone());
        }
        timed_out
    }

    /// Cancel a job; see [`CancelOutcome`].
    pub fn cancel(&self, job_id: JobId, reason: String) -> Result<CancelOutcome, EngineError> {
        let mut state = self.state.lock();
        let job = state.jobs.get_mut(&job_id).ok_or(EngineError::JobNotFound(job_id))?;
        match job.status {
            JobStatus::Pending | JobStatus::Queued => {
                job.error = Some(orc_core::JobError::new(orc_core::ErrorKind::Cancelled, reason));
                job.transition_to(JobStatus::Cancelled, &self.clock)?;
                let snapshot = job.clone();
                state.jobs.remove(&job_id);
                drop(state);
                self.repo.put_job(snapshot.clone());
                Ok(CancelOutcome::Cancelled(snapshot))
            }
            JobStatus::Running => Ok(CancelOutcome::AwaitingRobotAck(job.clone())),
            _ => Err(EngineError::AlreadyTerminal(job_id)),
        }
    }

    /// Complete a RUNNING job's cancellation after robot ack or grace period.
    pub fn force_cancel_running(&self, job_id: JobId, reason: String) -> Option<Job> {
        let mut state = self.state.lock();
        let job = state.jobs.get_mut(&job_id)?;
        if job.status != JobStatus::Running {
            return None;
        }
        job.error = Some(orc_core::JobError::new(orc_core::ErrorKind::Cancelled, reason));
        job.transition_to(JobStatus::Cancelled, &self.clock).ok()?;
        let snapshot = job.clone();
        state.jobs.remove(&job_id);
        drop(state);
        self.repo.put_job(snapshot.clone());
        Some(snapshot)
    }

    pub fn depth(&self) -> usize {
        self.state.lock().jobs.len()
    }

    /// Ids of non-terminal jobs currently assigned to `robot_id`, used to
    /// requeue a robot's in-flight work after it goes stale (§4.2).
    pub fn running_for_robot(&self, robot_id: RobotId) -> Vec<JobId> {
        self.state.lock().jobs.values().filter(|j| j.assigned_robot_id == Some(robot_id)).map(|j| j.id).collect()
    }

    /// Count of non-terminal jobs by status, for the `Metrics` reply.
    pub fn status_counts(&self) -> Vec<(JobStatus, u64)> {
        let state = self.state.lock();
        let mut counts: HashMap<JobStatus, u64> = HashMap::new();
        for job in state.jobs.values() {
            *counts.entry(job.status).or_insert(0) += 1;
        }
        counts.into_iter().collect()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
