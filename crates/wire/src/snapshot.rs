// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only DTOs returned across the control plane, converted from the
//! core domain types with `From` impls so the engine never hand-builds
//! wire structures field by field.

use chrono::{DateTime, Utc};
use orc_core::{
    Job, JobId, JobStatus, Priority, Robot, RobotId, RobotStatus, Schedule, ScheduleId,
    StatisticsSnapshot, Trigger, TriggerId, TriggerKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub workflow_id: String,
    pub workflow_name: String,
    pub priority: Priority,
    pub status: JobStatus,
    pub assigned_robot_id: Option<RobotId>,
    pub progress: u8,
    pub current_node: Option<String>,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub queued_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Job> for JobSnapshot {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            workflow_id: job.workflow_id.clone(),
            workflow_name: job.workflow_name.clone(),
            priority: job.priority,
            status: job.status,
            assigned_robot_id: job.assigned_robot_id,
            progress: job.progress,
            current_node: job.current_node.clone(),
            retry_count: job.retry_count,
            created_at: job.created_at,
            queued_at: job.queued_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSnapshot {
    pub robot_id: RobotId,
    pub name: String,
    pub tags: BTreeSet<String>,
    pub capabilities: BTreeSet<String>,
    pub status: RobotStatus,
    pub current_jobs: u32,
    pub max_concurrent_jobs: u32,
    pub last_heartbeat_at: DateTime<Utc>,
}

impl From<&Robot> for RobotSnapshot {
    fn from(robot: &Robot) -> Self {
        Self {
            robot_id: robot.id,
            name: robot.name.clone(),
            tags: robot.tags.clone(),
            capabilities: robot.capabilities.clone(),
            status: robot.status,
            current_jobs: robot.current_jobs,
            max_concurrent_jobs: robot.max_concurrent_jobs,
            last_heartbeat_at: robot.last_heartbeat_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub schedule_id: ScheduleId,
    pub workflow_id: String,
    pub enabled: bool,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub last_fire_at: Option<DateTime<Utc>>,
    pub run_count: u64,
}

impl From<&Schedule> for ScheduleSnapshot {
    fn from(schedule: &Schedule) -> Self {
        Self {
            schedule_id: schedule.id,
            workflow_id: schedule.workflow_id.clone(),
            enabled: schedule.enabled,
            next_fire_at: schedule.next_fire_at,
            last_fire_at: schedule.last_fire_at,
            run_count: schedule.run_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSnapshot {
    pub trigger_id: TriggerId,
    pub kind: TriggerKind,
    pub workflow_id: String,
    pub enabled: bool,
    pub fire_count: u64,
    pub last_fire_at: Option<DateTime<Utc>>,
}

impl From<&Trigger> for TriggerSnapshot {
    fn from(trigger: &Trigger) -> Self {
        Self {
            trigger_id: trigger.id,
            kind: trigger.kind,
            workflow_id: trigger.workflow_id.clone(),
            enabled: trigger.enabled,
            fire_count: trigger.fire_count,
            last_fire_at: trigger.last_fire_at,
        }
    }
}

/// Reply payload for `Metrics` (§6.1): queue depth by status, dispatch
/// stats, trigger stats, robot counts by status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub queue_depth_by_status: Vec<(JobStatus, u64)>,
    pub robots_by_status: Vec<(RobotStatus, u64)>,
    pub workflow_stats: Vec<(String, StatisticsSnapshot)>,
    pub robot_stats: Vec<(RobotId, StatisticsSnapshot)>,
}
