// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn once_fires_when_in_future_and_never_again() {
    let now = Utc::now();
    let at = now + chrono::Duration::seconds(30);
    let mut sched = Schedule::new(ScheduleId::new(), "wf-1", Frequency::Once { at }, Priority::Normal, None, now).unwrap();

    assert_eq!(sched.next_fire_at, Some(at));
    assert!(!sched.is_due(now));
    assert!(sched.is_due(at));

    sched.record_fire(at).unwrap();
    assert_eq!(sched.run_count, 1);
    assert_eq!(sched.next_fire_at, None, "ONCE never reschedules");
    assert!(!sched.is_due(at + chrono::Duration::seconds(1)));
}

#[test]
fn once_in_the_past_has_no_next_fire() {
    let now = Utc::now();
    let at = now - chrono::Duration::seconds(5);
    let sched = Schedule::new(ScheduleId::new(), "wf-1", Frequency::Once { at }, Priority::Normal, None, now).unwrap();
    assert_eq!(sched.next_fire_at, None);
}

#[test]
fn interval_reschedules_from_fire_time_not_original_due_time() {
    let now = Utc::now();
    let mut sched =
        Schedule::new(ScheduleId::new(), "wf-1", Frequency::Interval { period_secs: 300 }, Priority::Normal, None, now)
            .unwrap();
    assert_eq!(sched.next_fire_at, Some(now + chrono::Duration::seconds(300)));

    // Orchestrator was down; we "notice" the fire late.
    let late = now + chrono::Duration::seconds(900);
    sched.record_fire(late).unwrap();
    assert_eq!(sched.next_fire_at, Some(late + chrono::Duration::seconds(300)));
    assert_eq!(sched.run_count, 1, "missed fires are not caught up");
}

#[test]
fn interval_rejects_zero_period() {
    let now = Utc::now();
    let err = Schedule::new(ScheduleId::new(), "wf-1", Frequency::Interval { period_secs: 0 }, Priority::Normal, None, now)
        .unwrap_err();
    assert!(matches!(err, InvalidSchedule::ZeroInterval));
}

#[test]
fn cron_every_five_minutes_fires_three_times_over_seventeen_minutes() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let mut sched = Schedule::new(
        ScheduleId::new(),
        "wf-1",
        Frequency::Cron { expression: "0 */5 * * * *".to_string(), timezone: "UTC".to_string() },
        Priority::Normal,
        None,
        now,
    )
    .unwrap();

    let mut fires = 0;
    let mut clock = now;
    let deadline = now + chrono::Duration::minutes(17);
    while let Some(next) = sched.next_fire_at {
        if next > deadline {
            break;
        }
        clock = next;
        sched.record_fire(clock).unwrap();
        fires += 1;
    }

    assert_eq!(fires, 3);
    assert_eq!(sched.run_count, 3);
}

#[test]
fn cron_rejects_malformed_expression() {
    let now = Utc::now();
    let err = Schedule::new(
        ScheduleId::new(),
        "wf-1",
        Frequency::Cron { expression: "not a cron".to_string(), timezone: "UTC".to_string() },
        Priority::Normal,
        None,
        now,
    )
    .unwrap_err();
    assert!(matches!(err, InvalidSchedule::Cron { .. }));
}

#[test]
fn cron_rejects_unknown_timezone() {
    let now = Utc::now();
    let err = Schedule::new(
        ScheduleId::new(),
        "wf-1",
        Frequency::Cron { expression: "0 */5 * * * *".to_string(), timezone: "Mars/Olympus".to_string() },
        Priority::Normal,
        None,
        now,
    )
    .unwrap_err();
    assert!(matches!(err, InvalidSchedule::Timezone(_)));
}

#[test]
fn disable_then_enable_recomputes_next_fire_from_now() {
    let now = Utc::now();
    let mut sched =
        Schedule::new(ScheduleId::new(), "wf-1", Frequency::Interval { period_secs: 60 }, Priority::Normal, None, now)
            .unwrap();
    sched.disable();
    assert!(!sched.is_due(now + chrono::Duration::seconds(61)));

    let later = now + chrono::Duration::seconds(600);
    sched.enable(later).unwrap();
    assert_eq!(sched.next_fire_at, Some(later + chrono::Duration::seconds(60)));
}
