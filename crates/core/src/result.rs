// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal job results and the rolling statistics derived from them.

use crate::job::{ErrorKind, JobId};
use crate::robot::RobotId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Final disposition of a job. A strict subset of [`crate::job::JobStatus`]
/// containing only the terminal variants — kept separate so a `JobResult`
/// can never be constructed with a non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

crate::simple_display! {
    TerminalStatus {
        Completed => "completed",
        Failed => "failed",
        Timeout => "timeout",
        Cancelled => "cancelled",
    }
}

impl From<crate::job::JobStatus> for Option<TerminalStatus> {
    fn from(status: crate::job::JobStatus) -> Self {
        use crate::job::JobStatus as S;
        match status {
            S::Completed => Some(TerminalStatus::Completed),
            S::Failed => Some(TerminalStatus::Failed),
            S::Timeout => Some(TerminalStatus::Timeout),
            S::Cancelled => Some(TerminalStatus::Cancelled),
            S::Pending | S::Queued | S::Running => None,
        }
    }
}

/// Default number of trailing log lines retained per job result.
pub const DEFAULT_LOG_RETENTION: usize = 1000;

/// Default bounded-window size for per-key statistics (§4.7).
pub const DEFAULT_STATS_WINDOW: usize = 10_000;

/// Immutable record of a job's terminal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub workflow_id: String,
    pub robot_id: Option<RobotId>,
    pub terminal_status: TerminalStatus,
    pub duration_ms: u64,
    pub result_data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub stack_trace: Option<String>,
    pub failed_node: Option<String>,
    pub logs: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

impl JobResult {
    /// Build a result from a job's timestamps, truncating logs to
    /// [`DEFAULT_LOG_RETENTION`] trailing entries.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_id: JobId,
        workflow_id: impl Into<String>,
        robot_id: Option<RobotId>,
        terminal_status: TerminalStatus,
        started_at: Option<DateTime<Utc>>,
        queued_at: Option<DateTime<Utc>>,
        completed_at: DateTime<Utc>,
        result_data: Option<serde_json::Value>,
        error: Option<crate::job::JobError>,
        mut logs: Vec<String>,
    ) -> Self {
        let start = started_at.or(queued_at).unwrap_or(completed_at);
        let duration_ms = (completed_at - start).num_milliseconds().max(0) as u64;
        if logs.len() > DEFAULT_LOG_RETENTION {
            let excess = logs.len() - DEFAULT_LOG_RETENTION;
            logs.drain(..excess);
        }
        let (error_kind, message, stack_trace, failed_node) = match error {
            Some(e) => (Some(e.kind), Some(e.message), e.stack_trace, e.failed_node),
            None => (None, None, None, None),
        };
        Self {
            job_id,
            workflow_id: workflow_id.into(),
            robot_id,
            terminal_status,
            duration_ms,
            result_data,
            error: message,
            error_kind,
            stack_trace,
            failed_node,
            logs,
            recorded_at: completed_at,
        }
    }
}

/// Rolling counts and duration percentiles for a single workflow or robot.
///
/// Backed by a bounded deque of the last [`DEFAULT_STATS_WINDOW`] durations;
/// percentiles are recomputed on read from the retained window, never from
/// full history.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    window: VecDeque<(TerminalStatus, u64)>,
    window_size: usize,
    counts: StatusCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub completed: u64,
    pub failed: u64,
    pub timeout: u64,
    pub cancelled: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.completed + self.failed + self.timeout + self.cancelled
    }

    fn record(&mut self, status: TerminalStatus) {
        match status {
            TerminalStatus::Completed => self.completed += 1,
            TerminalStatus::Failed => self.failed += 1,
            TerminalStatus::Timeout => self.timeout += 1,
            TerminalStatus::Cancelled => self.cancelled += 1,
        }
    }
}

/// Snapshot of computed statistics, suitable for serialising into a
/// `Metrics` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub counts: StatusCounts,
    pub success_rate: f64,
    pub min_duration_ms: u64,
    pub avg_duration_ms: u64,
    pub max_duration_ms: u64,
    pub p50_duration_ms: u64,
    pub p90_duration_ms: u64,
    pub p99_duration_ms: u64,
}

impl Statistics {
    pub fn new(window_size: usize) -> Self {
        Self { window: VecDeque::with_capacity(window_size.min(1024)), window_size, counts: StatusCounts::default() }
    }

    pub fn record(&mut self, status: TerminalStatus, duration_ms: u64) {
        self.counts.record(status);
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back((status, duration_ms));
    }

    /// Throughput in completed-or-failed-or-timeout-or-cancelled results
    /// per hour, based on the window's elapsed wall-clock span.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let mut durations: Vec<u64> = self.window.iter().map(|(_, d)| *d).collect();
        durations.sort_unstable();

        let min = durations.first().copied().unwrap_or(0);
        let max = durations.last().copied().unwrap_or(0);
        let avg = if durations.is_empty() {
            0
        } else {
            (durations.iter().sum::<u64>() as f64 / durations.len() as f64).round() as u64
        };

        StatisticsSnapshot {
            counts: self.counts,
            success_rate: if self.counts.total() == 0 {
                0.0
            } else {
                self.counts.completed as f64 / self.counts.total() as f64
            },
            min_duration_ms: min,
            avg_duration_ms: avg,
            max_duration_ms: max,
            p50_duration_ms: percentile(&durations, 0.50),
            p90_duration_ms: percentile(&durations, 0.90),
            p99_duration_ms: percentile(&durations, 0.99),
        }
    }
}

/// Nearest-rank percentile over an already-sorted slice.
fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = ((p * sorted.len() as f64).ceil() as usize).saturating_sub(1);
    sorted[rank.min(sorted.len() - 1)]
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
