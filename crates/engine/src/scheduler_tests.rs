// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_core::FakeClock;
use orc_storage::InMemoryRepository;
use std::time::Duration as StdDuration;

fn harness() -> (Scheduler<FakeClock>, Queue<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    let repo = Arc::new(InMemoryRepository::new());
    let scheduler = Scheduler::new(repo.clone(), clock.clone());
    let queue = Queue::new(repo, clock.clone(), chrono::Duration::seconds(300), 100);
    (scheduler, queue, clock)
}

#[test]
fn interval_schedule_fires_and_enqueues_job() {
    let (scheduler, queue, clock) = harness();
    let id = scheduler
        .create("wf-1", Frequency::Interval { period_secs: 60 }, Priority::Normal, None)
        .unwrap();

    assert!(scheduler.tick(&queue).is_empty());
    clock.advance(StdDuration::from_secs(61));

    let fired = scheduler.tick(&queue);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].schedule_id, id);
    assert_eq!(queue.get(fired[0].job_id).unwrap().workflow_id, "wf-1");
    assert_eq!(queue.get(fired[0].job_id).unwrap().schedule_id, Some(id));
}

#[test]
fn once_schedule_fires_a_single_time() {
    let (scheduler, queue, clock) = harness();
    let at = clock.utc_now() + chrono::Duration::seconds(30);
    scheduler.create("wf-1", Frequency::Once { at }, Priority::Normal, None).unwrap();

    clock.advance(StdDuration::from_secs(31));
    assert_eq!(scheduler.tick(&queue).len(), 1);

    clock.advance(StdDuration::from_secs(3600));
    assert!(scheduler.tick(&queue).is_empty());
}

#[test]
fn disabled_schedule_never_fires() {
    let (scheduler, queue, clock) = harness();
    let id = scheduler.create("wf-1", Frequency::Interval { period_secs: 10 }, Priority::Normal, None).unwrap();
    scheduler.toggle(id, false).unwrap();

    clock.advance(StdDuration::from_secs(20));
    assert!(scheduler.tick(&queue).is_empty());
}

#[test]
fn re_enabling_recomputes_next_fire_from_now_not_missed_window() {
    let (scheduler, queue, clock) = harness();
    let id = scheduler.create("wf-1", Frequency::Interval { period_secs: 10 }, Priority::Normal, None).unwrap();
    scheduler.toggle(id, false).unwrap();
    clock.advance(StdDuration::from_secs(100));
    scheduler.toggle(id, true).unwrap();

    assert!(scheduler.tick(&queue).is_empty());
    clock.advance(StdDuration::from_secs(11));
    assert_eq!(scheduler.tick(&queue).len(), 1);
}

#[test]
fn delete_removes_schedule_and_stops_future_fires() {
    let (scheduler, queue, clock) = harness();
    let id = scheduler.create("wf-1", Frequency::Interval { period_secs: 10 }, Priority::Normal, None).unwrap();
    scheduler.delete(id).unwrap();

    clock.advance(StdDuration::from_secs(20));
    assert!(scheduler.tick(&queue).is_empty());
    assert!(scheduler.get(id).is_none());
}

#[test]
fn invalid_cron_expression_is_rejected_at_creation() {
    let (scheduler, _queue, _clock) = harness();
    let err = scheduler
        .create("wf-1", Frequency::Cron { expression: "not a cron".into(), timezone: "UTC".into() }, Priority::Normal, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn toggle_unknown_schedule_is_not_found() {
    let (scheduler, _queue, _clock) = harness();
    assert!(matches!(scheduler.toggle(ScheduleId::new(), false), Err(EngineError::ScheduleNotFound(_))));
}

#[test]
fn scheduled_job_carries_target_robot_id() {
    let (scheduler, queue, clock) = harness();
    let robot_id = RobotId::new();
    scheduler.create("wf-1", Frequency::Interval { period_secs: 5 }, Priority::High, Some(robot_id)).unwrap();

    clock.advance(StdDuration::from_secs(6));
    let fired = scheduler.tick(&queue);
    let job = queue.get(fired[0].job_id).unwrap();
    assert_eq!(job.target_robot_id, Some(robot_id));
    assert_eq!(job.priority, Priority::High);
}
