// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler (§4.5): recurring and one-shot schedules that enqueue
//! jobs at the computed `next_fire_at` instant.

use crate::queue::Queue;
use crate::EngineError;
use orc_core::{Clock, Frequency, JobId, JobSpec, Priority, RobotId, Schedule, ScheduleId};
use orc_storage::Repository;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A schedule that fired this tick, paired with the job it enqueued.
pub struct Fired {
    pub schedule_id: ScheduleId,
    pub job_id: JobId,
}

pub struct Scheduler<C: Clock> {
    schedules: RwLock<HashMap<ScheduleId, Schedule>>,
    repo: Arc<dyn Repository>,
    clock: C,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(repo: Arc<dyn Repository>, clock: C) -> Self {
        let schedules: HashMap<ScheduleId, Schedule> = repo.all_schedules().into_iter().map(|s| (s.id, s)).collect();
        Self { schedules: RwLock::new(schedules), repo, clock }
    }

    pub fn create(
        &self,
        workflow_id: impl Into<String>,
        frequency: Frequency,
        priority: Priority,
        target_robot_id: Option<RobotId>,
    ) -> Result<ScheduleId, EngineError> {
        let schedule = Schedule::new(ScheduleId::new(), workflow_id, frequency, priority, target_robot_id, self.clock.utc_now())
            .map_err(orc_core::ValidationError::from)?;
        let id = schedule.id;
        self.schedules.write().insert(id, schedule.clone());
        self.repo.put_schedule(schedule);
        Ok(id)
    }

    pub fn delete(&self, id: ScheduleId) -> Result<Schedule, EngineError> {
        let schedule = self.schedules.write().remove(&id).ok_or(EngineError::ScheduleNotFound(id))?;
        self.repo.remove_schedule(id);
        Ok(schedule)
    }

    pub fn toggle(&self, id: ScheduleId, enabled: bool) -> Result<Schedule, EngineError> {
        let now = self.clock.utc_now();
        let mut schedules = self.schedules.write();
        let schedule = schedules.get_mut(&id).ok_or(EngineError::ScheduleNotFound(id))?;
        if enabled {
            schedule.enable(now).map_err(orc_core::ValidationError::from)?;
        } else {
            schedule.disable();
        }
        let snapshot = schedule.clone();
        drop(schedules);
        self.repo.put_schedule(snapshot.clone());
        Ok(snapshot)
    }

    pub fn get(&self, id: ScheduleId) -> Option<Schedule> {
        self.schedules.read().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<Schedule> {
        self.schedules.read().values().cloned().collect()
    }

    /// Fire every due schedule, enqueueing one job each and recomputing
    /// `next_fire_at`. Missed fires are never caught up (§4.5) — a
    /// schedule disabled across several would-be firings simply resumes
    /// from `now` on its next due check.
    pub fn tick(&self, queue: &Queue<C>) -> Vec<Fired> {
        let now = self.clock.utc_now();
        let due: Vec<ScheduleId> = self.schedules.read().values().filter(|s| s.is_due(now)).map(|s| s.id).collect();

        let mut fired = Vec::with_capacity(due.len());
        for id in due {
            let mut schedules = self.schedules.write();
            let Some(schedule) = schedules.get_mut(&id) else { continue };
            if !schedule.is_due(now) {
                continue;
            }
            if schedule.record_fire(now).is_err() {
                continue;
            }
            let snapshot = schedule.clone();
            drop(schedules);
            self.repo.put_schedule(snapshot.clone());

            let mut spec_builder = JobSpec::builder(snapshot.workflow_id.clone()).priority(snapshot.priority);
            if let Some(robot_id) = snapshot.target_robot_id {
                spec_builder = spec_builder.target_robot_id(robot_id);
            }
            if let Ok(job_id) = queue.submit(spec_builder.build(), None, false, Some(id)) {
                fired.push(Fired { schedule_id: id, job_id });
            }
        }
        fired
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
