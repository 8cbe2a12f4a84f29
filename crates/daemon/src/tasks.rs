// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background tickers (§5): dispatch, timeout sweeping, stale-robot
//! sweeping, and schedule firing each run on their own interval, independent
//! of any connection. The scheduler has no dedicated cadence of its own in
//! configuration — it shares the dispatch interval, since a freshly fired
//! schedule only matters once the next dispatch tick picks its job up
//! anyway.

use crate::robot::RobotChannels;
use orc_core::SystemClock;
use orc_engine::Engine;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Runs `engine.dispatch_tick()` on `interval`, pushing each assignment to
/// its robot and requeuing the job if delivery fails.
pub async fn dispatch_loop(
    engine: Arc<Engine<SystemClock>>,
    robots: Arc<RobotChannels>,
    interval: std::time::Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return,
        }
        for assignment in engine.dispatch_tick() {
            let job_id = assignment.job.id;
            let robot_id = assignment.robot_id;
            if !crate::robot::push_assignment(&robots, &assignment).await {
                warn!(%job_id, %robot_id, "failed to deliver job assignment, requeuing");
                engine.reject_job(job_id, robot_id);
            }
        }
    }
}

/// Runs `engine.sweep_timeouts()` on `interval`, moving overdue RUNNING
/// jobs to TIMEOUT.
pub async fn timeout_sweep_loop(engine: Arc<Engine<SystemClock>>, interval: std::time::Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return,
        }
        let results = engine.sweep_timeouts();
        if !results.is_empty() {
            info!(count = results.len(), "swept timed-out jobs");
        }
    }
}

/// Runs `engine.sweep_stale()` on `interval`, marking robots OFFLINE once
/// their heartbeat goes quiet past the configured threshold.
pub async fn stale_robot_sweep_loop(engine: Arc<Engine<SystemClock>>, interval: std::time::Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return,
        }
        let stale = engine.sweep_stale();
        if !stale.is_empty() {
            info!(count = stale.len(), "marked robots offline after missed heartbeats");
        }
    }
}

/// Runs `engine.scheduler_tick()` on `interval`, enqueueing jobs for any due
/// schedule.
pub async fn scheduler_loop(engine: Arc<Engine<SystemClock>>, interval: std::time::Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return,
        }
        let fired = engine.scheduler_tick();
        if !fired.is_empty() {
            debug!(count = fired.len(), "schedules fired");
        }
    }
}
