// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_core::FakeClock;
use orc_storage::InMemoryRepository;
use std::collections::BTreeSet;
use std::time::Duration as StdDuration;

fn tags(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn fleet(clock: FakeClock) -> Fleet<FakeClock> {
    Fleet::new(Arc::new(InMemoryRepository::new()), clock, chrono::Duration::seconds(30))
}

#[test]
fn register_creates_online_robot() {
    let f = fleet(FakeClock::new());
    let id = f.register(RobotId::new(), "r1", tags(&["windows"]), BTreeSet::new(), 2).unwrap();
    let robot = f.get(id).unwrap();
    assert_eq!(robot.status, RobotStatus::Online);
    assert_eq!(robot.max_concurrent_jobs, 2);
}

#[test]
fn unregister_removes_unknown_robot_is_error() {
    let f = fleet(FakeClock::new());
    assert!(matches!(f.unregister(RobotId::new()), Err(EngineError::RobotNotFound(_))));
}

#[test]
fn eligible_for_requires_superset_of_tags_and_capabilities() {
    let f = fleet(FakeClock::new());
    let matching = f.register(RobotId::new(), "match", tags(&["windows", "sap"]), tags(&["ocr"]), 1).unwrap();
    f.register(RobotId::new(), "partial", tags(&["windows"]), BTreeSet::new(), 1).unwrap();

    let eligible = f.eligible_for(&tags(&["windows", "sap"]), &tags(&["ocr"]));
    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0].id, matching);
}

#[test]
fn eligible_for_excludes_robots_at_capacity() {
    let f = fleet(FakeClock::new());
    let id = f.register(RobotId::new(), "full", BTreeSet::new(), BTreeSet::new(), 1).unwrap();
    f.record_assign(id);

    assert!(f.eligible_for(&BTreeSet::new(), &BTreeSet::new()).is_empty());
}

#[test]
fn heartbeat_updates_load_and_timestamp() {
    let clock = FakeClock::new();
    let f = fleet(clock.clone());
    let id = f.register(RobotId::new(), "r1", BTreeSet::new(), BTreeSet::new(), 3).unwrap();
    clock.advance(StdDuration::from_secs(5));

    f.heartbeat(id, 2).unwrap();
    let robot = f.get(id).unwrap();
    assert_eq!(robot.current_jobs, 2);
    assert_eq!(robot.status, RobotStatus::Online);
}

#[test]
fn heartbeat_on_unknown_robot_is_error() {
    let f = fleet(FakeClock::new());
    assert!(matches!(f.heartbeat(RobotId::new(), 0), Err(EngineError::RobotNotFound(_))));
}

#[test]
fn record_assign_and_release_track_current_jobs() {
    let f = fleet(FakeClock::new());
    let id = f.register(RobotId::new(), "r1", BTreeSet::new(), BTreeSet::new(), 2).unwrap();

    f.record_assign(id);
    f.record_assign(id);
    assert_eq!(f.get(id).unwrap().status, RobotStatus::Busy);

    f.record_release(id, Some("wf-1"));
    let robot = f.get(id).unwrap();
    assert_eq!(robot.current_jobs, 1);
    assert_eq!(robot.status, RobotStatus::Online);
    assert_eq!(robot.last_success_workflow_id.as_deref(), Some("wf-1"));
}

#[test]
fn sweep_stale_marks_offline_and_excludes_from_eligibility() {
    let clock = FakeClock::new();
    let f = fleet(clock.clone());
    let id = f.register(RobotId::new(), "r1", BTreeSet::new(), BTreeSet::new(), 1).unwrap();

    assert!(f.sweep_stale().is_empty());
    clock.advance(StdDuration::from_secs(31));

    let offline = f.sweep_stale();
    assert_eq!(offline, vec![id]);
    assert_eq!(f.get(id).unwrap().status, RobotStatus::Offline);
    assert!(f.eligible_for(&BTreeSet::new(), &BTreeSet::new()).is_empty());
}

#[test]
fn sweep_stale_ignores_disabled_robots() {
    let clock = FakeClock::new();
    let f = fleet(clock.clone());
    let id = f.register(RobotId::new(), "r1", BTreeSet::new(), BTreeSet::new(), 1).unwrap();
    {
        let mut robots = f.robots.write();
        robots.get_mut(&id).unwrap().status = RobotStatus::Disabled;
    }
    clock.advance(StdDuration::from_secs(31));
    assert!(f.sweep_stale().is_empty());
}
