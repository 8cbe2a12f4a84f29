// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The robot wire protocol (§6.2, §4.4): a framed, adjacently-tagged
//! message on a long-lived bidirectional channel per robot.

use chrono::{DateTime, Utc};
use orc_core::{ErrorKind, JobId, RobotId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One frame on the robot channel: envelope fields plus a tagged payload.
///
/// `#[serde(flatten)]` merges `message`'s adjacent `type`/`payload` keys
/// with the envelope's own `id`/`timestamp`/`correlation_id` keys into a
/// single JSON object, matching the wire schema in §6.2 exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    #[serde(flatten)]
    pub message: RobotMessage,
}

impl Frame {
    pub fn new(message: RobotMessage) -> Self {
        Self { id: Uuid::new_v4(), timestamp: Utc::now(), correlation_id: None, message }
    }

    pub fn reply_to(self_id: Uuid, message: RobotMessage) -> Self {
        Self { id: Uuid::new_v4(), timestamp: Utc::now(), correlation_id: Some(self_id), message }
    }
}

/// Payload variants named exactly as the `type` field values in §6.2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RobotMessage {
    Register {
        robot_id: RobotId,
        name: String,
        env: String,
        tags: BTreeSet<String>,
        caps: BTreeSet<String>,
        max: u32,
    },
    RegisterAck {
        robot_id: RobotId,
        heartbeat_interval_seconds: u64,
    },
    Heartbeat {
        robot_id: RobotId,
        current_jobs: u32,
    },
    HeartbeatAck,
    Disconnect {
        robot_id: RobotId,
    },
    JobAssign {
        job_id: JobId,
        workflow_id: String,
        workflow_document: serde_json::Value,
        parameters: serde_json::Value,
        timeout_secs: u64,
    },
    JobAccept {
        job_id: JobId,
    },
    JobReject {
        job_id: JobId,
        reason: String,
    },
    JobProgress {
        job_id: JobId,
        pct: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
    },
    JobComplete {
        job_id: JobId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
    },
    JobFailed {
        job_id: JobId,
        kind: ErrorKind,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stack_trace: Option<String>,
    },
    JobCancel {
        job_id: JobId,
        reason: String,
    },
    JobCancelled {
        job_id: JobId,
    },
    StatusRequest,
    StatusResponse {
        current_jobs: u32,
        status: String,
    },
    LogEntry {
        job_id: JobId,
        line: String,
    },
    LogBatch {
        job_id: JobId,
        entries: Vec<String>,
    },
    Pause,
    Resume,
    Shutdown,
}

impl RobotMessage {
    /// The `type` discriminant as it appears on the wire, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            RobotMessage::Register { .. } => "register",
            RobotMessage::RegisterAck { .. } => "register_ack",
            RobotMessage::Heartbeat { .. } => "heartbeat",
            RobotMessage::HeartbeatAck => "heartbeat_ack",
            RobotMessage::Disconnect { .. } => "disconnect",
            RobotMessage::JobAssign { .. } => "job_assign",
            RobotMessage::JobAccept { .. } => "job_accept",
            RobotMessage::JobReject { .. } => "job_reject",
            RobotMessage::JobProgress { .. } => "job_progress",
            RobotMessage::JobComplete { .. } => "job_complete",
            RobotMessage::JobFailed { .. } => "job_failed",
            RobotMessage::JobCancel { .. } => "job_cancel",
            RobotMessage::JobCancelled { .. } => "job_cancelled",
            RobotMessage::StatusRequest => "status_request",
            RobotMessage::StatusResponse { .. } => "status_response",
            RobotMessage::LogEntry { .. } => "log_entry",
            RobotMessage::LogBatch { .. } => "log_batch",
            RobotMessage::Pause => "pause",
            RobotMessage::Resume => "resume",
            RobotMessage::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
#[path = "robot_message_tests.rs"]
mod tests;
