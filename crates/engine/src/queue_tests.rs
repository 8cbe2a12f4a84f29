// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_core::{FakeClock, JobSpec, Priority, RobotId};
use orc_storage::InMemoryRepository;
use std::time::Duration as StdDuration;

fn queue(clock: FakeClock) -> Queue<FakeClock> {
    Queue::new(Arc::new(InMemoryRepository::new()), clock, chrono::Duration::seconds(300), 100)
}

#[test]
fn submit_rejects_empty_workflow_id() {
    let q = queue(FakeClock::new());
    let spec = JobSpec::builder("").build();
    assert!(matches!(q.submit(spec, None, true, None), Err(EngineError::Validation(_))));
}

#[test]
fn submit_rejects_zero_timeout() {
    let q = queue(FakeClock::new());
    let spec = JobSpec::builder("wf-1").timeout_secs(0).build();
    assert!(matches!(q.submit(spec, None, true, None), Err(EngineError::Validation(_))));
}

#[test]
fn submitted_job_is_queued_immediately() {
    let q = queue(FakeClock::new());
    let spec = JobSpec::builder("wf-1").build();
    let id = q.submit(spec, None, true, None).unwrap();
    assert_eq!(q.get(id).unwrap().status, orc_core::JobStatus::Queued);
}

#[test]
fn duplicate_submit_within_dedup_window_returns_same_job() {
    let clock = FakeClock::new();
    let q = queue(clock.clone());
    let spec1 = JobSpec::builder("wf-1").build();
    let spec2 = JobSpec::builder("wf-1").build();

    let id1 = q.submit(spec1, Some("dedup-a".into()), true, None).unwrap();
    clock.advance(StdDuration::from_secs(10));
    let id2 = q.submit(spec2, Some("dedup-a".into()), true, None).unwrap();

    assert_eq!(id1, id2);
    assert_eq!(q.depth(), 1);
}

#[test]
fn duplicate_submit_after_dedup_window_creates_new_job() {
    let clock = FakeClock::new();
    let q = queue(clock.clone());
    let spec1 = JobSpec::builder("wf-1").build();
    let spec2 = JobSpec::builder("wf-1").build();

    let id1 = q.submit(spec1, Some("dedup-a".into()), true, None).unwrap();
    clock.advance(StdDuration::from_secs(301));
    let id2 = q.submit(spec2, Some("dedup-a".into()), true, None).unwrap();

    assert_ne!(id1, id2);
}

#[test]
fn queue_full_rejects_new_submissions() {
    let q = Queue::new(Arc::new(InMemoryRepository::new()), FakeClock::new(), chrono::Duration::seconds(300), 1);
    q.submit(JobSpec::builder("wf-1").build(), None, true, None).unwrap();
    let err = q.submit(JobSpec::builder("wf-2").build(), None, true, None).unwrap_err();
    assert!(matches!(err, EngineError::QueueFull(1)));
}

#[test]
fn queued_snapshot_orders_by_priority_then_fifo() {
    let clock = FakeClock::new();
    let q = queue(clock.clone());

    let low = q.submit(JobSpec::builder("wf-1").priority(Priority::Low).build(), None, false, None).unwrap();
    clock.advance(StdDuration::from_secs(1));
    let critical = q.submit(JobSpec::builder("wf-2").priority(Priority::Critical).build(), None, false, None).unwrap();
    clock.advance(StdDuration::from_secs(1));
    let normal_first = q.submit(JobSpec::builder("wf-3").priority(Priority::Normal).build(), None, false, None).unwrap();
    clock.advance(StdDuration::from_secs(1));
    let normal_second = q.submit(JobSpec::builder("wf-4").priority(Priority::Normal).build(), None, false, None).unwrap();

    let order: Vec<_> = q.queued_snapshot().into_iter().map(|j| j.id).collect();
    assert_eq!(order, vec![critical, normal_first, normal_second, low]);
}

#[test]
fn queued_snapshot_excludes_future_scheduled_jobs() {
    let clock = FakeClock::new();
    let q = queue(clock.clone());
    let future = clock.utc_now() + chrono::Duration::seconds(3600);
    q.submit(JobSpec::builder("wf-1").scheduled_time(future).build(), None, false, None).unwrap();
    let ready = q.submit(JobSpec::builder("wf-2").build(), None, false, None).unwrap();

    let order: Vec<_> = q.queued_snapshot().into_iter().map(|j| j.id).collect();
    assert_eq!(order, vec![ready]);
}

#[test]
fn try_dequeue_moves_job_to_running() {
    let q = queue(FakeClock::new());
    let id = q.submit(JobSpec::builder("wf-1").build(), None, false, None).unwrap();
    let robot = RobotId::new();

    let job = q.try_dequeue(id, robot).unwrap();
    assert_eq!(job.status, orc_core::JobStatus::Running);
    assert_eq!(job.assigned_robot_id, Some(robot));
}

#[test]
fn try_dequeue_twice_only_succeeds_once() {
    let q = queue(FakeClock::new());
    let id = q.submit(JobSpec::builder("wf-1").build(), None, false, None).unwrap();
    assert!(q.try_dequeue(id, RobotId::new()).is_some());
    assert!(q.try_dequeue(id, RobotId::new()).is_none());
}

#[test]
fn complete_requires_matching_running_robot() {
    let q = queue(FakeClock::new());
    let id = q.submit(JobSpec::builder("wf-1").build(), None, false, None).unwrap();
    let robot = RobotId::new();
    q.try_dequeue(id, robot).unwrap();

    assert!(q.complete(id, RobotId::new(), serde_json::json!({})).is_none());
    let job = q.complete(id, robot, serde_json::json!({"ok": true})).unwrap();
    assert_eq!(job.status, orc_core::JobStatus::Completed);
    assert_eq!(q.depth(), 0);
}

#[test]
fn fail_records_job_error() {
    let q = queue(FakeClock::new());
    let id = q.submit(JobSpec::builder("wf-1").build(), None, false, None).unwrap();
    let robot = RobotId::new();
    q.try_dequeue(id, robot).unwrap();

    let error = orc_core::JobError::new(orc_core::ErrorKind::Execution, "boom");
    let job = q.fail(id, robot, error).unwrap();
    assert_eq!(job.status, orc_core::JobStatus::Failed);
    assert_eq!(job.error.unwrap().message, "boom");
}

#[test]
fn requeue_from_running_increments_retry_and_returns_to_queue() {
    let q = queue(FakeClock::new());
    let id = q.submit(JobSpec::builder("wf-1").build(), None, false, None).unwrap();
    q.try_dequeue(id, RobotId::new()).unwrap();

    let job = q.requeue_from_running(id).unwrap();
    assert_eq!(job.status, orc_core::JobStatus::Queued);
    assert_eq!(job.retry_count, 1);
    assert_eq!(q.queued_snapshot().len(), 1);
}

#[test]
fn sweep_timeouts_marks_expired_leases_and_removes_from_queue() {
    let clock = FakeClock::new();
    let q = queue(clock.clone());
    let id = q.submit(JobSpec::builder("wf-1").timeout_secs(10).build(), None, false, None).unwrap();
    q.try_dequeue(id, RobotId::new()).unwrap();

    assert!(q.sweep_timeouts().is_empty());
    clock.advance(StdDuration::from_secs(11));

    let timed_out = q.sweep_timeouts();
    assert_eq!(timed_out.len(), 1);
    assert_eq!(timed_out[0].status, orc_core::JobStatus::Timeout);
    assert_eq!(q.depth(), 0);
}

#[test]
fn cancel_pending_job_is_immediate() {
    let q = queue(FakeClock::new());
    let id = q.submit(JobSpec::builder("wf-1").build(), None, false, None).unwrap();
    match q.cancel(id, "no longer needed".into()).unwrap() {
        CancelOutcome::Cancelled(job) => assert_eq!(job.status, orc_core::JobStatus::Cancelled),
        CancelOutcome::AwaitingRobotAck(_) => panic!("expected immediate cancel"),
    }
    assert_eq!(q.depth(), 0);
}

#[test]
fn cancel_running_job_awaits_robot_ack() {
    let q = queue(FakeClock::new());
    let id = q.submit(JobSpec::builder("wf-1").build(), None, false, None).unwrap();
    q.try_dequeue(id, RobotId::new()).unwrap();

    match q.cancel(id, "stop".into()).unwrap() {
        CancelOutcome::AwaitingRobotAck(job) => assert_eq!(job.status, orc_core::JobStatus::Running),
        CancelOutcome::Cancelled(_) => panic!("expected awaiting ack"),
    }
    assert_eq!(q.depth(), 1, "job stays RUNNING until force_cancel_running");

    let job = q.force_cancel_running(id, "stop".into()).unwrap();
    assert_eq!(job.status, orc_core::JobStatus::Cancelled);
    assert_eq!(q.depth(), 0);
}

#[test]
fn cancel_terminal_job_is_rejected() {
    let q = queue(FakeClock::new());
    let id = q.submit(JobSpec::builder("wf-1").build(), None, false, None).unwrap();
    let robot = RobotId::new();
    q.try_dequeue(id, robot).unwrap();
    q.complete(id, robot, serde_json::json!({})).unwrap();

    assert!(matches!(q.cancel(id, "too late".into()), Err(EngineError::AlreadyTerminal(_))));
}

#[test]
fn cancel_unknown_job_is_not_found() {
    let q = queue(FakeClock::new());
    assert!(matches!(q.cancel(orc_core::JobId::new(), "x".into()), Err(EngineError::JobNotFound(_))));
}
