// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::job::JobError;

#[test]
fn duration_measured_from_started_at_when_present() {
    let now = Utc::now();
    let started = now - chrono::Duration::seconds(10);
    let queued = now - chrono::Duration::seconds(20);
    let result = JobResult::new(
        JobId::new(),
        "wf-1",
        Some(RobotId::new()),
        TerminalStatus::Completed,
        Some(started),
        Some(queued),
        now,
        None,
        None,
        vec![],
    );
    assert_eq!(result.duration_ms, 10_000);
}

#[test]
fn duration_falls_back_to_queued_at_when_never_started() {
    let now = Utc::now();
    let queued = now - chrono::Duration::seconds(5);
    let result = JobResult::new(
        JobId::new(),
        "wf-1",
        None,
        TerminalStatus::Cancelled,
        None,
        Some(queued),
        now,
        None,
        None,
        vec![],
    );
    assert_eq!(result.duration_ms, 5_000);
}

#[test]
fn logs_truncated_to_retention_window() {
    let now = Utc::now();
    let logs: Vec<String> = (0..(DEFAULT_LOG_RETENTION + 50)).map(|i| i.to_string()).collect();
    let result = JobResult::new(
        JobId::new(),
        "wf-1",
        None,
        TerminalStatus::Completed,
        Some(now),
        None,
        now,
        None,
        None,
        logs,
    );
    assert_eq!(result.logs.len(), DEFAULT_LOG_RETENTION);
    assert_eq!(result.logs.first().unwrap(), "50", "oldest entries are dropped, not newest");
}

#[test]
fn error_fields_flattened_from_job_error() {
    let now = Utc::now();
    let error = JobError::new(ErrorKind::Execution, "boom").with_node("step1").with_stack_trace("trace");
    let result = JobResult::new(
        JobId::new(),
        "wf-1",
        None,
        TerminalStatus::Failed,
        Some(now),
        None,
        now,
        None,
        Some(error),
        vec![],
    );
    assert_eq!(result.error.as_deref(), Some("boom"));
    assert_eq!(result.error_kind, Some(ErrorKind::Execution));
    assert_eq!(result.failed_node.as_deref(), Some("step1"));
}

#[test]
fn statistics_window_evicts_oldest() {
    let mut stats = Statistics::new(3);
    stats.record(TerminalStatus::Completed, 10);
    stats.record(TerminalStatus::Completed, 20);
    stats.record(TerminalStatus::Completed, 30);
    stats.record(TerminalStatus::Completed, 40);

    let snap = stats.snapshot();
    assert_eq!(snap.min_duration_ms, 20, "the 10ms sample should have been evicted");
    assert_eq!(snap.max_duration_ms, 40);
}

#[test]
fn statistics_counts_are_not_windowed() {
    let mut stats = Statistics::new(2);
    stats.record(TerminalStatus::Completed, 1);
    stats.record(TerminalStatus::Failed, 1);
    stats.record(TerminalStatus::Completed, 1);

    let snap = stats.snapshot();
    assert_eq!(snap.counts.total(), 3, "counts persist even once a sample leaves the duration window");
    assert_eq!(snap.counts.completed, 2);
    assert_eq!(snap.counts.failed, 1);
}

#[test]
fn success_rate_uses_lifetime_counts() {
    let mut stats = Statistics::new(100);
    stats.record(TerminalStatus::Completed, 1);
    stats.record(TerminalStatus::Completed, 1);
    stats.record(TerminalStatus::Failed, 1);

    let snap = stats.snapshot();
    assert!((snap.success_rate - (2.0 / 3.0)).abs() < 1e-9);
}

#[test]
fn percentiles_over_known_distribution() {
    let mut stats = Statistics::new(100);
    for i in 1..=100u64 {
        stats.record(TerminalStatus::Completed, i);
    }
    let snap = stats.snapshot();
    assert_eq!(snap.p50_duration_ms, 50);
    assert_eq!(snap.p90_duration_ms, 90);
    assert_eq!(snap.p99_duration_ms, 99);
}

#[test]
fn empty_statistics_snapshot_has_zeroed_fields() {
    let stats = Statistics::new(10);
    let snap = stats.snapshot();
    assert_eq!(snap.counts.total(), 0);
    assert_eq!(snap.success_rate, 0.0);
    assert_eq!(snap.p99_duration_ms, 0);
}
