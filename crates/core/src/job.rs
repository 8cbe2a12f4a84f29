// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, state machine, and the job record itself.

use crate::clock::Clock;
use crate::priority::Priority;
use crate::robot::RobotId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

crate::define_id! {
    /// Unique identifier for a job instance.
    pub struct JobId("job-");
}

/// Status of a job. See the state machine table in the orchestrator spec
/// (§4.1): every transition not explicitly allowed here is rejected with
/// [`StateTransitionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Timeout => "timeout",
        Cancelled => "cancelled",
    }
}

impl JobStatus {
    /// Terminal statuses never transition further.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Timeout | JobStatus::Cancelled)
    }

    /// Ordinary (non-recovery) transitions allowed by the state machine.
    ///
    /// Excludes the RUNNING→QUEUED recovery transition, which is only
    /// reachable through [`Job::requeue_from_running`] — the dispatcher's
    /// robot-loss/reject path, never a generic caller.
    fn can_transition_to(self, to: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, to),
            (Pending, Queued)
                | (Pending, Cancelled)
                | (Queued, Running)
                | (Queued, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Timeout)
                | (Running, Cancelled)
        )
    }
}

/// An invalid state transition was attempted; the job is left unchanged.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid transition {job_id}: {from} -> {to}")]
pub struct StateTransitionError {
    pub job_id: JobId,
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Kind of error attached to a non-successful terminal job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The per-job timeout elapsed with no terminal report.
    Timeout,
    /// The robot reported a workflow-execution failure.
    Execution,
    /// The job was cancelled by an external caller.
    Cancelled,
    /// The robot that owned the job disappeared and the lease expired.
    RobotLost,
}

crate::simple_display! {
    ErrorKind {
        Timeout => "timeout",
        Execution => "execution",
        Cancelled => "cancelled",
        RobotLost => "robot_lost",
    }
}

/// Structured error context carried by a non-COMPLETED terminal job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl JobError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), failed_node: None, stack_trace: None }
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.failed_node = Some(node.into());
        self
    }

    pub fn with_stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }
}

/// Default per-job timeout when the submitter doesn't supply one.
pub const DEFAULT_JOB_TIMEOUT_SECONDS: u64 = 3600;

/// Parameters accepted by [`Job::new`], mirroring `SubmitJob` (§6.1).
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub workflow_id: String,
    pub workflow_name: String,
    pub workflow_document: serde_json::Value,
    pub parameters: serde_json::Value,
    pub priority: Priority,
    pub timeout_secs: u64,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub target_robot_id: Option<RobotId>,
    pub required_tags: BTreeSet<String>,
    pub required_capabilities: BTreeSet<String>,
}

impl JobSpec {
    pub fn builder(workflow_id: impl Into<String>) -> JobSpecBuilder {
        JobSpecBuilder::new(workflow_id)
    }
}

/// Builder for [`JobSpec`] with spec-defined defaults.
pub struct JobSpecBuilder {
    workflow_id: String,
    workflow_name: String,
    workflow_document: serde_json::Value,
    parameters: serde_json::Value,
    priority: Priority,
    timeout_secs: u64,
    scheduled_time: Option<DateTime<Utc>>,
    target_robot_id: Option<RobotId>,
    required_tags: BTreeSet<String>,
    required_capabilities: BTreeSet<String>,
}

impl JobSpecBuilder {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        let workflow_id = workflow_id.into();
        Self {
            workflow_name: workflow_id.clone(),
            workflow_id,
            workflow_document: serde_json::Value::Null,
            parameters: serde_json::Value::Null,
            priority: Priority::Normal,
            timeout_secs: DEFAULT_JOB_TIMEOUT_SECONDS,
            scheduled_time: None,
            target_robot_id: None,
            required_tags: BTreeSet::new(),
            required_capabilities: BTreeSet::new(),
        }
    }

    crate::setters! {
        into {
            workflow_name: String,
        }
        set {
            workflow_document: serde_json::Value,
            parameters: serde_json::Value,
            priority: Priority,
            timeout_secs: u64,
            required_tags: BTreeSet<String>,
            required_capabilities: BTreeSet<String>,
        }
        option {
            scheduled_time: DateTime<Utc>,
            target_robot_id: RobotId,
        }
    }

    pub fn build(self) -> JobSpec {
        JobSpec {
            workflow_id: self.workflow_id,
            workflow_name: self.workflow_name,
            workflow_document: self.workflow_document,
            parameters: self.parameters,
            priority: self.priority,
            timeout_secs: self.timeout_secs,
            scheduled_time: self.scheduled_time,
            target_robot_id: self.target_robot_id,
            required_tags: self.required_tags,
            required_capabilities: self.required_capabilities,
        }
    }
}

/// A job instance tracked by the orchestrator between submission and
/// archival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub workflow_id: String,
    pub workflow_name: String,
    pub workflow_document: serde_json::Value,
    pub parameters: serde_json::Value,
    pub priority: Priority,
    pub timeout_secs: u64,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub target_robot_id: Option<RobotId>,
    pub required_tags: BTreeSet<String>,
    pub required_capabilities: BTreeSet<String>,

    pub status: JobStatus,
    pub assigned_robot_id: Option<RobotId>,
    pub created_at: DateTime<Utc>,
    pub queued_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: u8,
    pub current_node: Option<String>,
    pub retry_count: u32,
    pub dedup_key: Option<String>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    /// Lease deadline while RUNNING; `None` otherwise. Mirrored in the
    /// fleet manager's [`crate::assignment::Assignment`] for the per-robot view.
    pub leased_until: Option<DateTime<Utc>>,
    pub error: Option<JobError>,
    pub result: Option<serde_json::Value>,
    /// Name of the schedule that created this job, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<crate::schedule::ScheduleId>,
}

impl Job {
    /// Create a new job in PENDING status.
    pub fn new(id: JobId, spec: JobSpec, clock: &impl Clock) -> Self {
        Self {
            id,
            workflow_id: spec.workflow_id,
            workflow_name: spec.workflow_name,
            workflow_document: spec.workflow_document,
            parameters: spec.parameters,
            priority: spec.priority,
            timeout_secs: spec.timeout_secs,
            scheduled_time: spec.scheduled_time,
            target_robot_id: spec.target_robot_id,
            required_tags: spec.required_tags,
            required_capabilities: spec.required_capabilities,
            status: JobStatus::Pending,
            assigned_robot_id: None,
            created_at: clock.utc_now(),
            queued_at: None,
            started_at: None,
            completed_at: None,
            progress: 0,
            current_node: None,
            retry_count: 0,
            dedup_key: None,
            last_heartbeat_at: None,
            leased_until: None,
            error: None,
            result: None,
            schedule_id: None,
        }
    }

    /// Apply an ordinary transition, validating against the state machine.
    /// Rejected transitions leave the job unchanged.
    pub fn transition_to(
        &mut self,
        to: JobStatus,
        clock: &impl Clock,
    ) -> Result<(), StateTransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(StateTransitionError { job_id: self.id, from: self.status, to });
        }
        self.apply_transition(to, clock);
        Ok(())
    }

    fn apply_transition(&mut self, to: JobStatus, clock: &impl Clock) {
        let now = clock.utc_now();
        match to {
            JobStatus::Queued => {
                self.queued_at = Some(now);
            }
            JobStatus::Running => {
                self.started_at = Some(now);
                self.leased_until = Some(now + chrono::Duration::seconds(self.timeout_secs as i64));
            }
            JobStatus::Completed | JobStatus::Failed | JobStatus::Timeout | JobStatus::Cancelled => {
                self.completed_at = Some(now);
                self.assigned_robot_id = None;
                self.leased_until = None;
            }
            JobStatus::Pending => {}
        }
        self.status = to;
    }

    /// Assign this job to a robot and move it to RUNNING. Only valid from
    /// QUEUED — the normal dequeue path.
    pub fn assign(&mut self, robot_id: RobotId, clock: &impl Clock) -> Result<(), StateTransitionError> {
        self.transition_to(JobStatus::Running, clock)?;
        self.assigned_robot_id = Some(robot_id);
        Ok(())
    }

    /// The specialised RUNNING→QUEUED recovery transition (§4.3, §4.4):
    /// robot rejected the job, or its transport died and the lease expired.
    /// Not reachable through [`Job::transition_to`].
    pub fn requeue_from_running(&mut self, clock: &impl Clock) -> Result<(), StateTransitionError> {
        if self.status != JobStatus::Running {
            return Err(StateTransitionError { job_id: self.id, from: self.status, to: JobStatus::Queued });
        }
        self.assigned_robot_id = None;
        self.leased_until = None;
        self.status = JobStatus::Queued;
        self.queued_at = Some(clock.utc_now());
        self.retry_count += 1;
        Ok(())
    }

    /// Record progress from a `JobProgress` message. Extends the lease by
    /// the job's timeout (sliding window) and stamps the heartbeat.
    /// Rejected (returns `false`, job unchanged) if not RUNNING.
    pub fn update_progress(&mut self, pct: u8, current_node: Option<String>, clock: &impl Clock) -> bool {
        if self.status != JobStatus::Running {
            return false;
        }
        self.progress = pct.min(100);
        if current_node.is_some() {
            self.current_node = current_node;
        }
        let now = clock.utc_now();
        self.last_heartbeat_at = Some(now);
        self.leased_until = Some(now + chrono::Duration::seconds(self.timeout_secs as i64));
        true
    }

    /// True once the job's lease has passed `now` while still RUNNING.
    pub fn lease_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Running
            && self.leased_until.map(|l| l < now).unwrap_or(false)
    }

    /// True if `scheduled_time` is unset or has already passed.
    pub fn is_eligible_by_time(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_time.map(|t| t <= now).unwrap_or(true)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            workflow_id: String = "wf-test",
            workflow_name: String = "test workflow",
        }
        set {
            workflow_document: serde_json::Value = serde_json::Value::Null,
            parameters: serde_json::Value = serde_json::Value::Null,
            priority: Priority = Priority::Normal,
            timeout_secs: u64 = DEFAULT_JOB_TIMEOUT_SECONDS,
            required_tags: std::collections::BTreeSet<String> = std::collections::BTreeSet::new(),
            required_capabilities: std::collections::BTreeSet<String> = std::collections::BTreeSet::new(),
            status: JobStatus = JobStatus::Pending,
            progress: u8 = 0,
            retry_count: u32 = 0,
        }
        option {
            scheduled_time: DateTime<Utc> = None,
            target_robot_id: RobotId = None,
            assigned_robot_id: RobotId = None,
            queued_at: DateTime<Utc> = None,
            started_at: DateTime<Utc> = None,
            completed_at: DateTime<Utc> = None,
            current_node: String = None,
            dedup_key: String = None,
            last_heartbeat_at: DateTime<Utc> = None,
            leased_until: DateTime<Utc> = None,
            error: JobError = None,
            result: serde_json::Value = None,
            schedule_id: crate::schedule::ScheduleId = None,
        }
        computed {
            id: JobId = JobId::new(),
            created_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
