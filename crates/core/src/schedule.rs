// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurring and one-shot schedules, and `next_fire_at` computation.

use crate::robot::RobotId;
use crate::priority::Priority;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

crate::define_id! {
    /// Unique identifier for a schedule.
    pub struct ScheduleId("sch-");
}

/// How often a schedule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frequency {
    /// Fires exactly once at the given instant.
    Once { at: DateTime<Utc> },
    /// Fires every `period_secs` seconds from the schedule's creation time.
    Interval { period_secs: u64 },
    /// Fires on a 5- or 6-field cron expression, evaluated in `timezone`.
    Cron { expression: String, timezone: String },
}

/// An invalid cron expression, interval, or timezone name was supplied.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvalidSchedule {
    #[error("invalid cron expression {expression:?}: {source}")]
    Cron { expression: String, #[source] source: cron::error::Error },
    #[error("unknown timezone {0:?}")]
    Timezone(String),
    #[error("interval period must be greater than zero")]
    ZeroInterval,
}

impl Frequency {
    /// Validate the frequency and, if it parses, compute the first
    /// `next_fire_at` relative to `after`.
    fn first_fire_after(&self, after: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, InvalidSchedule> {
        match self {
            Frequency::Once { at } => Ok(if *at > after { Some(*at) } else { None }),
            Frequency::Interval { period_secs } => {
                if *period_secs == 0 {
                    return Err(InvalidSchedule::ZeroInterval);
                }
                Ok(Some(after + chrono::Duration::seconds(*period_secs as i64)))
            }
            Frequency::Cron { expression, timezone } => {
                let tz = parse_tz(timezone)?;
                let schedule = parse_cron(expression)?;
                let local_after = after.with_timezone(&tz);
                Ok(schedule.after(&local_after).next().map(|t| t.with_timezone(&Utc)))
            }
        }
    }
}

fn parse_tz(name: &str) -> Result<Tz, InvalidSchedule> {
    Tz::from_str(name).map_err(|_| InvalidSchedule::Timezone(name.to_string()))
}

fn parse_cron(expression: &str) -> Result<cron::Schedule, InvalidSchedule> {
    cron::Schedule::from_str(expression)
        .map_err(|source| InvalidSchedule::Cron { expression: expression.to_string(), source })
}

/// A recurring or one-shot schedule bound to a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub workflow_id: String,
    pub frequency: Frequency,
    pub priority: Priority,
    pub target_robot_id: Option<RobotId>,
    pub enabled: bool,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub last_fire_at: Option<DateTime<Utc>>,
    pub run_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(
        id: ScheduleId,
        workflow_id: impl Into<String>,
        frequency: Frequency,
        priority: Priority,
        target_robot_id: Option<RobotId>,
        now: DateTime<Utc>,
    ) -> Result<Self, InvalidSchedule> {
        let next_fire_at = frequency.first_fire_after(now)?;
        Ok(Self {
            id,
            workflow_id: workflow_id.into(),
            frequency,
            priority,
            target_robot_id,
            enabled: true,
            next_fire_at,
            last_fire_at: None,
            run_count: 0,
            created_at: now,
        })
    }

    /// True once `next_fire_at` has arrived. Disabled and exhausted
    /// (ONCE already fired, or `next_fire_at` is `None`) schedules never fire.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_fire_at.map(|t| t <= now).unwrap_or(false)
    }

    /// Record a fire at `now` and recompute `next_fire_at`. Per §4.5, missed
    /// fires are not caught up — this always schedules the *next* fire
    /// relative to `now`, not relative to the missed `next_fire_at`.
    pub fn record_fire(&mut self, now: DateTime<Utc>) -> Result<(), InvalidSchedule> {
        self.last_fire_at = Some(now);
        self.run_count += 1;
        self.next_fire_at = self.frequency.first_fire_after(now)?;
        Ok(())
    }

    /// Enable the schedule and recompute `next_fire_at` from `now`, per §4.5.
    pub fn enable(&mut self, now: DateTime<Utc>) -> Result<(), InvalidSchedule> {
        self.enabled = true;
        self.next_fire_at = self.frequency.first_fire_after(now)?;
        Ok(())
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

crate::builder! {
    pub struct ScheduleBuilder => Schedule {
        into {
            workflow_id: String = "wf-1",
        }
        set {
            frequency: Frequency = Frequency::Interval { period_secs: 60 },
            priority: Priority = Priority::Normal,
            enabled: bool = true,
            run_count: u64 = 0,
        }
        option {
            target_robot_id: RobotId = None,
            next_fire_at: DateTime<Utc> = None,
            last_fire_at: DateTime<Utc> = None,
        }
        computed {
            id: ScheduleId = ScheduleId::new(),
            created_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
