// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatcher (§4.3): pairs queued jobs with eligible robots on each
//! tick using a pluggable load-balancing strategy.

use crate::fleet::Fleet;
use crate::queue::Queue;
use orc_core::{Clock, Job, LoadBalancingStrategy, Robot, RobotId};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A job paired with the robot it was assigned to during a dispatch tick.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub job: Job,
    pub robot_id: RobotId,
}

pub struct Dispatcher<C: Clock> {
    queue: Arc<Queue<C>>,
    fleet: Arc<Fleet<C>>,
    strategy: LoadBalancingStrategy,
    round_robin_cursor: AtomicUsize,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(queue: Arc<Queue<C>>, fleet: Arc<Fleet<C>>, strategy: LoadBalancingStrategy) -> Self {
        Self { queue, fleet, strategy, round_robin_cursor: AtomicUsize::new(0) }
    }

    /// Run one dispatch pass: snapshot queued jobs in priority order, then
    /// for each try to pick and atomically claim an eligible robot. Uses a
    /// snapshot-then-act pattern so the queue and fleet locks are never
    /// held simultaneously.
    pub fn tick(&self) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        for job in self.queue.queued_snapshot() {
            let candidates = self.candidates_for(&job);
            if candidates.is_empty() {
                continue;
            }
            let Some(chosen) = self.select(&candidates, &job) else { continue };
            if let Some(assigned) = self.queue.try_dequeue(job.id, chosen.id) {
                self.fleet.record_assign(chosen.id);
                assignments.push(Assignment { job: assigned, robot_id: chosen.id });
            }
        }
        assignments
    }

    fn candidates_for(&self, job: &Job) -> Vec<Robot> {
        if let Some(target) = job.target_robot_id {
            self.fleet
                .get(target)
                .filter(|r| r.eligible_for(&job.required_tags, &job.required_capabilities))
                .into_iter()
                .collect()
        } else {
            self.fleet.eligible_for(&job.required_tags, &job.required_capabilities)
        }
    }

    fn select(&self, candidates: &[Robot], job: &Job) -> Option<Robot> {
        match self.strategy {
            LoadBalancingStrategy::RoundRobin => self.select_round_robin(candidates),
            LoadBalancingStrategy::LeastLoaded => select_least_loaded(candidates),
            LoadBalancingStrategy::Random => select_random(candidates),
            LoadBalancingStrategy::Affinity => select_affinity(candidates, &job.workflow_id),
        }
    }

    fn select_round_robin(&self, candidates: &[Robot]) -> Option<Robot> {
        if candidates.is_empty() {
            return None;
        }
        let mut sorted = candidates.to_vec();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        let idx = self.round_robin_cursor.fetch_add(1, Ordering::Relaxed) % sorted.len();
        Some(sorted[idx].clone())
    }
}

fn select_least_loaded(candidates: &[Robot]) -> Option<Robot> {
    candidates
        .iter()
        .min_by(|a, b| {
            let load_a = a.current_jobs as f64 / a.max_concurrent_jobs.max(1) as f64;
            let load_b = b.current_jobs as f64 / b.max_concurrent_jobs.max(1) as f64;
            load_a.partial_cmp(&load_b).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.id.cmp(&b.id))
        })
        .cloned()
}

fn select_random(candidates: &[Robot]) -> Option<Robot> {
    if candidates.is_empty() {
        return None;
    }
    let idx = rand::thread_rng().gen_range(0..candidates.len());
    Some(candidates[idx].clone())
}

/// Prefer the robot that most recently completed this workflow
/// successfully; fall back to least-loaded among the candidates.
fn select_affinity(candidates: &[Robot], workflow_id: &str) -> Option<Robot> {
    candidates
        .iter()
        .find(|r| r.last_success_workflow_id.as_deref() == Some(workflow_id))
        .cloned()
        .or_else(|| select_least_loaded(candidates))
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
