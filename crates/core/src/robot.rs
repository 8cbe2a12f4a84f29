// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Robot identity, connection state, and eligibility checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

crate::define_id! {
    /// Unique identifier for a robot (execution worker).
    pub struct RobotId("rbt-");
}

/// Connection/availability state of a registered robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    /// Connected, accepting new jobs.
    Online,
    /// Connected but at `max_concurrent_jobs` capacity.
    Busy,
    /// Heartbeat missed past the staleness threshold; connection presumed dead.
    Offline,
    /// Administratively excluded from dispatch.
    Disabled,
}

crate::simple_display! {
    RobotStatus {
        Online => "online",
        Busy => "busy",
        Offline => "offline",
        Disabled => "disabled",
    }
}

/// A registered robot and the state the fleet manager tracks for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    pub id: RobotId,
    pub name: String,
    pub tags: BTreeSet<String>,
    pub capabilities: BTreeSet<String>,
    pub max_concurrent_jobs: u32,
    pub current_jobs: u32,
    pub status: RobotStatus,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat_at: DateTime<Utc>,
    /// Job most recently completed successfully on this robot, used by
    /// the AFFINITY dispatch strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_workflow_id: Option<String>,
}

impl Robot {
    pub fn new(
        id: RobotId,
        name: impl Into<String>,
        tags: BTreeSet<String>,
        capabilities: BTreeSet<String>,
        max_concurrent_jobs: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            tags,
            capabilities,
            max_concurrent_jobs,
            current_jobs: 0,
            status: RobotStatus::Online,
            registered_at: now,
            last_heartbeat_at: now,
            last_success_workflow_id: None,
        }
    }

    pub fn has_spare_capacity(&self) -> bool {
        self.current_jobs < self.max_concurrent_jobs
    }

    /// True once `last_heartbeat_at` is older than `stale_after` relative to `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_heartbeat_at) > stale_after
    }

    /// A robot can receive dispatch when ONLINE (or BUSY with spare slots
    /// freed since the last status recompute) and not stale.
    pub fn is_dispatchable(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> bool {
        matches!(self.status, RobotStatus::Online | RobotStatus::Busy)
            && self.has_spare_capacity()
            && !self.is_stale(now, stale_after)
    }

    /// A robot is eligible for a job if it has every required tag and
    /// capability (subset match, §4.3).
    pub fn eligible_for(&self, required_tags: &BTreeSet<String>, required_capabilities: &BTreeSet<String>) -> bool {
        required_tags.is_subset(&self.tags) && required_capabilities.is_subset(&self.capabilities)
    }

    pub fn record_heartbeat(&mut self, now: DateTime<Utc>) {
        self.last_heartbeat_at = now;
        if self.status == RobotStatus::Offline {
            self.status = RobotStatus::Online;
        }
    }

    /// Recompute BUSY/ONLINE from current load. Never overrides DISABLED
    /// or OFFLINE — those are set explicitly by the caller.
    pub fn recompute_load_status(&mut self) {
        if matches!(self.status, RobotStatus::Online | RobotStatus::Busy) {
            self.status = if self.has_spare_capacity() { RobotStatus::Online } else { RobotStatus::Busy };
        }
    }
}

crate::builder! {
    pub struct RobotBuilder => Robot {
        into {
            name: String = "test-robot",
        }
        set {
            tags: std::collections::BTreeSet<String> = std::collections::BTreeSet::new(),
            capabilities: std::collections::BTreeSet<String> = std::collections::BTreeSet::new(),
            max_concurrent_jobs: u32 = 1,
            current_jobs: u32 = 0,
            status: RobotStatus = RobotStatus::Online,
        }
        option {
            last_success_workflow_id: String = None,
        }
        computed {
            id: RobotId = RobotId::new(),
            registered_at: DateTime<Utc> = Utc::now(),
            last_heartbeat_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "robot_tests.rs"]
mod tests;
