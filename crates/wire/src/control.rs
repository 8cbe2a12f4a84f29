// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound control API request/response DTOs (§6.1).

use crate::snapshot::{JobSnapshot, RobotSnapshot, ScheduleSnapshot, StatisticsResponse, TriggerSnapshot};
use chrono::{DateTime, Utc};
use orc_core::{JobId, JobStatus, Priority, RobotId, RobotStatus, ScheduleId, TriggerId, TriggerKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A request sent by an orchestrator-external caller over the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    SubmitJob {
        workflow_id: String,
        workflow_document: serde_json::Value,
        #[serde(default)]
        parameters: serde_json::Value,
        #[serde(default)]
        priority: Priority,
        #[serde(default)]
        target_robot_id: Option<RobotId>,
        #[serde(default)]
        scheduled_time: Option<DateTime<Utc>>,
        #[serde(default)]
        timeout_secs: Option<u64>,
        #[serde(default)]
        check_duplicate: bool,
        #[serde(default)]
        required_tags: BTreeSet<String>,
        #[serde(default)]
        required_capabilities: BTreeSet<String>,
    },
    CancelJob {
        job_id: JobId,
        reason: String,
    },
    RetryJob {
        job_id: JobId,
    },
    GetJob {
        job_id: JobId,
    },
    ListJobs {
        #[serde(default)]
        status: Option<JobStatus>,
        #[serde(default)]
        robot_id: Option<RobotId>,
        #[serde(default)]
        workflow_id: Option<String>,
        #[serde(default)]
        page: u32,
        #[serde(default = "default_page_size")]
        page_size: u32,
    },
    RegisterRobot {
        robot_id: RobotId,
        name: String,
        env: String,
        tags: BTreeSet<String>,
        caps: BTreeSet<String>,
        max: u32,
    },
    UnregisterRobot {
        robot_id: RobotId,
    },
    ListRobots {
        #[serde(default)]
        status: Option<RobotStatus>,
    },
    CreateSchedule {
        workflow_id: String,
        frequency: orc_core::Frequency,
        #[serde(default)]
        target_robot_id: Option<RobotId>,
        #[serde(default)]
        priority: Priority,
    },
    DeleteSchedule {
        schedule_id: ScheduleId,
    },
    ToggleSchedule {
        schedule_id: ScheduleId,
        enabled: bool,
    },
    RegisterTrigger {
        kind: TriggerKind,
        config: orc_core::TriggerConfig,
        workflow_id: String,
    },
    UnregisterTrigger {
        trigger_id: TriggerId,
    },
    EnableTrigger {
        trigger_id: TriggerId,
    },
    DisableTrigger {
        trigger_id: TriggerId,
    },
    FireTriggerManually {
        trigger_id: TriggerId,
        #[serde(default)]
        payload: serde_json::Value,
    },
    Metrics,
}

fn default_page_size() -> u32 {
    50
}

/// Error kinds surfaced synchronously to control-plane callers (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidWorkflow,
    DuplicateJob,
    QueueFull,
    NotFound,
    AlreadyTerminal,
    NotTerminal,
    Conflict,
    InvalidCron,
    InvalidConfig,
}

/// Response returned for a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    JobSubmitted {
        job_id: JobId,
        status: JobStatus,
    },
    Job {
        job: Option<Box<JobSnapshot>>,
    },
    Jobs {
        jobs: Vec<JobSnapshot>,
        total: u64,
    },
    Robot {
        robot: Box<RobotSnapshot>,
    },
    Robots {
        robots: Vec<RobotSnapshot>,
    },
    Schedule {
        schedule: Box<ScheduleSnapshot>,
    },
    Trigger {
        trigger: Box<TriggerSnapshot>,
    },
    Metrics {
        stats: Box<StatisticsResponse>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_tag_matches_variant_name() {
        let req = Request::RetryJob { job_id: JobId::from_string("job-x") };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["type"], "RetryJob");
    }

    #[test]
    fn list_jobs_defaults_page_size_to_fifty() {
        let req: Request = serde_json::from_value(serde_json::json!({"type": "ListJobs"})).unwrap();
        match req {
            Request::ListJobs { page, page_size, .. } => {
                assert_eq!(page, 0);
                assert_eq!(page_size, 50);
            }
            _ => panic!("expected ListJobs"),
        }
    }

    #[test]
    fn error_response_round_trips() {
        let resp = Response::Error { kind: ErrorKind::NotFound, message: "no such job".into() };
        let json = serde_json::to_string(&resp).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }
}
