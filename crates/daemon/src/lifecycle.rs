// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon boot sequence and graceful shutdown (§5, §6.3).
//!
//! The shape mirrors a conventional single-instance daemon: create the
//! state directory, take an exclusive lock so only one `orcd` runs against
//! a given state directory, load whatever was last persisted, and only
//! bind listeners once that has all succeeded. There is no write-ahead log
//! to replay — [`orc_storage::InMemoryRepository`] reconstructs its entire
//! state from one JSON snapshot, so startup is just a single read.

use crate::config::DaemonConfig;
use crate::error::LifecycleError;
use fs2::FileExt;
use orc_core::SystemClock;
use orc_engine::Engine;
use orc_storage::InMemoryRepository;
use std::fs::{File, OpenOptions};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Everything the running daemon needs, handed off to the listener and
/// background-task spawners in `main`.
pub struct Daemon {
    pub config: DaemonConfig,
    pub engine: Arc<Engine<SystemClock>>,
    pub repo: Arc<InMemoryRepository>,
    pub start_time: Instant,
    /// Held for the lifetime of the process; released (and the lock freed)
    /// on drop.
    _lock_file: File,
}

/// Boot sequence: create directories, acquire the singleton lock, load the
/// persisted snapshot, and construct the engine. Does not bind any network
/// listener — callers do that afterward so a startup failure here never
/// leaves a socket behind.
pub fn startup(config: DaemonConfig) -> Result<Daemon, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)
        .map_err(|e| LifecycleError::CreateStateDir(config.state_dir.clone(), e))?;
    std::fs::create_dir_all(&config.log_dir)
        .map_err(|e| LifecycleError::CreateStateDir(config.log_dir.clone(), e))?;

    let lock_path = config.lock_path();
    let lock_file = OpenOptions::new().create(true).write(true).open(&lock_path)?;
    lock_file.try_lock_exclusive().map_err(|e| LifecycleError::LockFailed(lock_path.clone(), e))?;
    std::fs::write(&lock_path, std::process::id().to_string())?;

    let repo = Arc::new(InMemoryRepository::load(config.snapshot_path())?);
    info!(
        jobs = repo.all_jobs().len(),
        robots = repo.all_robots().len(),
        schedules = repo.all_schedules().len(),
        triggers = repo.all_triggers().len(),
        "loaded persisted state"
    );

    let engine = Arc::new(Engine::new(repo.clone() as Arc<dyn orc_storage::Repository>, SystemClock, &config.engine));

    Ok(Daemon { config, engine, repo, start_time: Instant::now(), _lock_file: lock_file })
}

/// Persist the repository and remove the files a clean shutdown owns. The
/// lock itself is released when `daemon` (and its `_lock_file`) drops.
pub fn shutdown(daemon: &Daemon) {
    if let Err(e) = daemon.repo.persist() {
        tracing::warn!(error = %e, "failed to persist snapshot on shutdown");
    }
    let socket_path = daemon.config.socket_path();
    if socket_path.exists() {
        if let Err(e) = std::fs::remove_file(&socket_path) {
            tracing::warn!(error = %e, path = %socket_path.display(), "failed to remove control socket");
        }
    }
    let lock_path = daemon.config.lock_path();
    if let Err(e) = std::fs::remove_file(&lock_path) {
        tracing::warn!(error = %e, path = %lock_path.display(), "failed to remove lock file");
    }
    info!("orcd shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &std::path::Path) -> DaemonConfig {
        let mut config = DaemonConfig::default();
        config.state_dir = dir.to_path_buf();
        config.log_dir = dir.join("logs");
        config
    }

    #[test]
    fn startup_creates_state_dir_and_lock_file() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let daemon = startup(config).unwrap();
        assert!(daemon.config.lock_path().exists());
        assert_eq!(daemon.repo.all_jobs().len(), 0);
    }

    #[test]
    fn second_startup_against_same_dir_fails_to_lock() {
        let dir = tempdir().unwrap();
        let first = startup(config_in(dir.path())).unwrap();
        let second = startup(config_in(dir.path()));
        assert!(matches!(second, Err(LifecycleError::LockFailed(_, _))));
        drop(first);
    }

    #[test]
    fn shutdown_persists_snapshot_and_removes_lock() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let snapshot_path = config.snapshot_path();
        let daemon = startup(config).unwrap();
        daemon.engine.register_robot(
            orc_core::RobotId::new(),
            "r1",
            Default::default(),
            Default::default(),
            1,
        ).unwrap();
        shutdown(&daemon);
        assert!(snapshot_path.exists());
        assert!(!daemon.config.lock_path().exists());
    }
}
