// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fleet manager (§4.2): robot registration, heartbeat tracking,
//! eligibility queries, and staleness detection.

use crate::EngineError;
use orc_core::{Clock, Robot, RobotId, RobotStatus};
use orc_storage::Repository;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub struct Fleet<C: Clock> {
    robots: RwLock<HashMap<RobotId, Robot>>,
    repo: Arc<dyn Repository>,
    clock: C,
    stale_after: chrono::Duration,
}

impl<C: Clock> Fleet<C> {
    pub fn new(repo: Arc<dyn Repository>, clock: C, stale_after: chrono::Duration) -> Self {
        let robots: HashMap<RobotId, Robot> = repo.all_robots().into_iter().map(|r| (r.id, r)).collect();
        Self { robots: RwLock::new(robots), repo, clock, stale_after }
    }

    /// Register a robot under the id it supplies (§4.4 `Register`/`RegisterRobot`
    /// carry their own `robot_id` rather than having one minted here).
    pub fn register(
        &self,
        id: RobotId,
        name: impl Into<String>,
        tags: BTreeSet<String>,
        capabilities: BTreeSet<String>,
        max_concurrent_jobs: u32,
    ) -> Result<RobotId, EngineError> {
        let mut robots = self.robots.write();
        if robots.contains_key(&id) {
            return Err(EngineError::DuplicateRobot(id));
        }
        let robot = Robot::new(id, name, tags, capabilities, max_concurrent_jobs, self.clock.utc_now());
        robots.insert(id, robot.clone());
        drop(robots);
        self.repo.put_robot(robot);
        Ok(id)
    }

    pub fn unregister(&self, robot_id: RobotId) -> Result<Robot, EngineError> {
        let robot = self.robots.write().remove(&robot_id).ok_or(EngineError::RobotNotFound(robot_id))?;
        self.repo.remove_robot(robot_id);
        Ok(robot)
    }

    pub fn get(&self, robot_id: RobotId) -> Option<Robot> {
        self.robots.read().get(&robot_id).cloned()
    }

    pub fn all(&self) -> Vec<Robot> {
        self.robots.read().values().cloned().collect()
    }

    /// Robots with every required tag/capability, ONLINE or BUSY, not
    /// stale, and with spare capacity (§4.3 eligibility filter).
    pub fn eligible_for(&self, required_tags: &BTreeSet<String>, required_capabilities: &BTreeSet<String>) -> Vec<Robot> {
        let now = self.clock.utc_now();
        self.robots
            .read()
            .values()
            .filter(|r| r.is_dispatchable(now, self.stale_after) && r.eligible_for(required_tags, required_capabilities))
            .cloned()
            .collect()
    }

    pub fn heartbeat(&self, robot_id: RobotId, current_jobs: u32) -> Result<(), EngineError> {
        let now = self.clock.utc_now();
        let mut robots = self.robots.write();
        let robot = robots.get_mut(&robot_id).ok_or(EngineError::RobotNotFound(robot_id))?;
        robot.record_heartbeat(now);
        robot.current_jobs = current_jobs;
        robot.recompute_load_status();
        let snapshot = robot.clone();
        drop(robots);
        self.repo.put_robot(snapshot);
        Ok(())
    }

    pub fn record_assign(&self, robot_id: RobotId) {
        let mut robots = self.robots.write();
        if let Some(robot) = robots.get_mut(&robot_id) {
            robot.current_jobs += 1;
            robot.recompute_load_status();
            let snapshot = robot.clone();
            drop(robots);
            self.repo.put_robot(snapshot);
        }
    }

    pub fn record_release(&self, robot_id: RobotId, completed_workflow_id: Option<&str>) {
        let mut robots = self.robots.write();
        if let Some(robot) = robots.get_mut(&robot_id) {
            robot.current_jobs = robot.current_jobs.saturating_sub(1);
            if let Some(workflow_id) = completed_workflow_id {
                robot.last_success_workflow_id = Some(workflow_id.to_string());
            }
            robot.recompute_load_status();
            let snapshot = robot.clone();
            drop(robots);
            self.repo.put_robot(snapshot);
        }
    }

    /// Mark robots whose heartbeat has gone stale as OFFLINE. Returns the
    /// ids that transitioned so the caller can requeue their in-flight jobs.
    pub fn sweep_stale(&self) -> Vec<RobotId> {
        let now = self.clock.utc_now();
        let mut robots = self.robots.write();
        let mut gone_offline = Vec::new();
        for robot in robots.values_mut() {
            if matches!(robot.status, RobotStatus::Online | RobotStatus::Busy) && robot.is_stale(now, self.stale_after) {
                robot.status = RobotStatus::Offline;
                gone_offline.push(robot.id);
            }
        }
        let snapshots: Vec<Robot> = gone_offline.iter().filter_map(|id| robots.get(id).cloned()).collect();
        drop(robots);
        for robot in snapshots {
            self.repo.put_robot(robot);
        }
        gone_offline
    }
}

#[cfg(test)]
#[path = "fleet_tests.rs"]
mod tests;
