// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn tags(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn new_robot_is_online_with_zero_load() {
    let robot = Robot::new(RobotId::new(), "r1", tags(&[]), tags(&[]), 2, Utc::now());
    assert_eq!(robot.status, RobotStatus::Online);
    assert!(robot.has_spare_capacity());
}

#[test]
fn spare_capacity_false_at_max_jobs() {
    let mut robot = Robot::builder().max_concurrent_jobs(1).current_jobs(1).build();
    assert!(!robot.has_spare_capacity());
    robot.current_jobs = 0;
    assert!(robot.has_spare_capacity());
}

#[test]
fn eligible_for_requires_full_tag_and_capability_superset() {
    let robot = Robot::builder()
        .tags(tags(&["windows", "finance"]))
        .capabilities(tags(&["sap", "excel"]))
        .build();

    assert!(robot.eligible_for(&tags(&["windows"]), &tags(&["sap"])));
    assert!(robot.eligible_for(&tags(&[]), &tags(&[])));
    assert!(!robot.eligible_for(&tags(&["linux"]), &tags(&[])));
    assert!(!robot.eligible_for(&tags(&[]), &tags(&["oracle"])));
}

#[test]
fn is_stale_compares_against_threshold() {
    let now = Utc::now();
    let mut robot = Robot::new(RobotId::new(), "r1", tags(&[]), tags(&[]), 1, now);
    robot.last_heartbeat_at = now - chrono::Duration::seconds(45);
    assert!(robot.is_stale(now, chrono::Duration::seconds(30)));
    assert!(!robot.is_stale(now, chrono::Duration::seconds(60)));
}

#[test]
fn record_heartbeat_clears_offline() {
    let mut robot = Robot::builder().status(RobotStatus::Offline).build();
    robot.record_heartbeat(Utc::now());
    assert_eq!(robot.status, RobotStatus::Online);
}

#[test]
fn record_heartbeat_does_not_clear_disabled() {
    let mut robot = Robot::builder().status(RobotStatus::Disabled).build();
    robot.record_heartbeat(Utc::now());
    assert_eq!(robot.status, RobotStatus::Disabled);
}

#[test]
fn recompute_load_status_flips_between_online_and_busy() {
    let mut robot = Robot::builder().max_concurrent_jobs(1).current_jobs(0).status(RobotStatus::Online).build();
    robot.current_jobs = 1;
    robot.recompute_load_status();
    assert_eq!(robot.status, RobotStatus::Busy);

    robot.current_jobs = 0;
    robot.recompute_load_status();
    assert_eq!(robot.status, RobotStatus::Online);
}

#[test]
fn recompute_load_status_never_overrides_disabled_or_offline() {
    let mut robot = Robot::builder().status(RobotStatus::Disabled).current_jobs(0).max_concurrent_jobs(1).build();
    robot.recompute_load_status();
    assert_eq!(robot.status, RobotStatus::Disabled);

    robot.status = RobotStatus::Offline;
    robot.recompute_load_status();
    assert_eq!(robot.status, RobotStatus::Offline);
}

#[test]
fn is_dispatchable_requires_capacity_and_freshness() {
    let now = Utc::now();
    let mut robot = Robot::new(RobotId::new(), "r1", tags(&[]), tags(&[]), 1, now);
    assert!(robot.is_dispatchable(now, chrono::Duration::seconds(30)));

    robot.current_jobs = 1;
    assert!(!robot.is_dispatchable(now, chrono::Duration::seconds(30)));

    robot.current_jobs = 0;
    let later = now + chrono::Duration::seconds(60);
    assert!(!robot.is_dispatchable(later, chrono::Duration::seconds(30)));
}
