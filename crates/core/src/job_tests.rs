// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use crate::robot::RobotId;

fn spec() -> JobSpec {
    JobSpec::builder("wf-1").workflow_name("demo").build()
}

#[test]
fn new_job_starts_pending() {
    let clock = FakeClock::new();
    let job = Job::new(JobId::new(), spec(), &clock);
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.progress, 0);
    assert!(job.assigned_robot_id.is_none());
}

#[test]
fn pending_to_queued_stamps_queued_at() {
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    job.transition_to(JobStatus::Queued, &clock).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.queued_at.is_some());
}

#[test]
fn queued_to_pending_is_rejected() {
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    job.transition_to(JobStatus::Queued, &clock).unwrap();
    let err = job.transition_to(JobStatus::Pending, &clock).unwrap_err();
    assert_eq!(err.from, JobStatus::Queued);
    assert_eq!(err.to, JobStatus::Pending);
    assert_eq!(job.status, JobStatus::Queued, "rejected transition must not mutate state");
}

#[test]
fn assign_sets_robot_and_lease() {
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    job.transition_to(JobStatus::Queued, &clock).unwrap();
    let robot = RobotId::new();
    job.assign(robot, &clock).unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.assigned_robot_id, Some(robot));
    assert!(job.leased_until.is_some());
    assert!(job.started_at.is_some());
}

#[test]
fn terminal_transition_clears_assignment_and_lease() {
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    job.transition_to(JobStatus::Queued, &clock).unwrap();
    job.assign(RobotId::new(), &clock).unwrap();
    job.transition_to(JobStatus::Completed, &clock).unwrap();
    assert!(job.assigned_robot_id.is_none());
    assert!(job.leased_until.is_none());
    assert!(job.completed_at.is_some());
    assert!(job.is_terminal());
}

#[test]
fn requeue_from_running_clears_robot_and_increments_retry() {
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    job.transition_to(JobStatus::Queued, &clock).unwrap();
    job.assign(RobotId::new(), &clock).unwrap();
    job.requeue_from_running(&clock).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.assigned_robot_id.is_none());
    assert_eq!(job.retry_count, 1);
}

#[test]
fn requeue_from_running_rejected_outside_running() {
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    let err = job.requeue_from_running(&clock).unwrap_err();
    assert_eq!(err.from, JobStatus::Pending);
}

#[test]
fn requeue_is_not_reachable_via_transition_to() {
    // RUNNING -> QUEUED must only be reachable through requeue_from_running.
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    job.transition_to(JobStatus::Queued, &clock).unwrap();
    job.assign(RobotId::new(), &clock).unwrap();
    assert!(job.transition_to(JobStatus::Queued, &clock).is_err());
}

#[test]
fn update_progress_extends_lease_and_sets_heartbeat() {
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    job.transition_to(JobStatus::Queued, &clock).unwrap();
    job.assign(RobotId::new(), &clock).unwrap();
    let lease_before = job.leased_until.unwrap();

    clock.advance(std::time::Duration::from_secs(10));
    assert!(job.update_progress(42, Some("step2".to_string()), &clock));

    assert_eq!(job.progress, 42);
    assert_eq!(job.current_node.as_deref(), Some("step2"));
    assert!(job.last_heartbeat_at.is_some());
    assert!(job.leased_until.unwrap() > lease_before);
}

#[test]
fn update_progress_rejected_when_not_running() {
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    assert!(!job.update_progress(50, None, &clock));
    assert_eq!(job.progress, 0);
}

#[test]
fn update_progress_clamps_above_100() {
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    job.transition_to(JobStatus::Queued, &clock).unwrap();
    job.assign(RobotId::new(), &clock).unwrap();
    job.update_progress(150, None, &clock);
    assert_eq!(job.progress, 100);
}

#[test]
fn lease_expired_true_only_while_running_past_deadline() {
    let clock = FakeClock::new();
    let mut job = Job::new(JobId::new(), spec(), &clock);
    job.transition_to(JobStatus::Queued, &clock).unwrap();
    job.assign(RobotId::new(), &clock).unwrap();

    assert!(!job.lease_expired(clock.utc_now()));

    let far_future = clock.utc_now() + chrono::Duration::seconds(job.timeout_secs as i64 + 1);
    assert!(job.lease_expired(far_future));

    job.transition_to(JobStatus::Completed, &clock).unwrap();
    assert!(!job.lease_expired(far_future), "terminal jobs never report lease expiry");
}

#[test]
fn is_eligible_by_time_respects_scheduled_time() {
    let clock = FakeClock::new();
    let spec = JobSpec::builder("wf-1").scheduled_time(clock.utc_now() + chrono::Duration::seconds(60)).build();
    let job = Job::new(JobId::new(), spec, &clock);
    assert!(!job.is_eligible_by_time(clock.utc_now()));
    assert!(job.is_eligible_by_time(clock.utc_now() + chrono::Duration::seconds(61)));
}

#[test]
fn builder_produces_queued_job_with_distinct_ids() {
    let a = Job::builder().status(JobStatus::Queued).build();
    let b = Job::builder().status(JobStatus::Queued).build();
    assert_eq!(a.status, JobStatus::Queued);
    assert_ne!(a.id, b.id);
}
