// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator Daemon (`orcd`)
//!
//! Background process owning the job queue, fleet registry, dispatcher,
//! scheduler, and trigger manager, and serving both the robot wire protocol
//! and the operator control plane.

mod config;
mod env;
mod error;
mod lifecycle;
mod listener;
mod robot;
mod tasks;
mod triggers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::DaemonConfig;
use error::LifecycleError;
use listener::{ListenCtx, Listener};
use orc_core::JobStatus;
use robot::RobotChannels;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info, warn};
use triggers::TriggerSupervisor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("orcd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("orcd {}", env!("CARGO_PKG_VERSION"));
                println!("Orchestrator daemon — background process that owns the job queue, fleet,");
                println!("dispatcher, scheduler, and trigger manager.");
                println!();
                println!("USAGE:");
                println!("    orcd");
                println!();
                println!("Configuration is read from $ORC_STATE_DIR/orcd.toml (or the default state");
                println!("directory) and from ORC_* environment variables.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: orcd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config_path = env::state_dir().join("orcd.toml");
    let config = DaemonConfig::load(&config_path)?;

    rotate_log_if_needed(&config.log_path());
    let log_guard = setup_logging(&config)?;

    info!("starting orcd");

    let daemon = match lifecycle::startup(config) {
        Ok(d) => d,
        Err(LifecycleError::LockFailed(path, _)) => {
            eprintln!("orcd is already running (lock held at {})", path.display());
            drop(log_guard);
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "failed to start daemon");
            drop(log_guard);
            return Err(e.into());
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let robots = Arc::new(RobotChannels::new());
    let listen_ctx = Arc::new(ListenCtx {
        engine: daemon.engine.clone(),
        robots: robots.clone(),
        auth_token: daemon.config.auth_token.clone(),
        ipc_timeout: env::ipc_timeout(),
        cancel_grace: daemon.config.engine.graceful_shutdown(),
    });
    let listener = match Listener::bind(&daemon.config.socket_path(), daemon.config.control_tcp_port, listen_ctx).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "failed to bind control listener");
            drop(log_guard);
            return Err(e.into());
        }
    };
    tokio::spawn(listener.run(shutdown_rx.clone()));

    let robot_host = env::robot_bind().unwrap_or_else(|| "0.0.0.0".to_string());
    let robot_engine = daemon.engine.clone();
    let robot_channels = robots.clone();
    let robot_port = daemon.config.robot_port;
    let robot_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = robot::run((robot_host, robot_port), robot_engine, robot_channels, robot_shutdown).await {
            error!(error = %e, "robot listener failed to bind");
        }
    });

    let tick_override = env::tick_override_ms().map(std::time::Duration::from_millis);
    let dispatch_interval = tick_override.unwrap_or_else(|| daemon.config.engine.dispatch_interval());
    let timeout_interval = tick_override.unwrap_or_else(|| daemon.config.engine.timeout_check_interval());

    tokio::spawn(tasks::dispatch_loop(daemon.engine.clone(), robots.clone(), dispatch_interval, shutdown_rx.clone()));
    tokio::spawn(tasks::timeout_sweep_loop(daemon.engine.clone(), timeout_interval, shutdown_rx.clone()));
    tokio::spawn(tasks::stale_robot_sweep_loop(daemon.engine.clone(), timeout_interval, shutdown_rx.clone()));
    tokio::spawn(tasks::scheduler_loop(daemon.engine.clone(), dispatch_interval, shutdown_rx.clone()));

    let supervisor = TriggerSupervisor::new(daemon.engine.clone());
    tokio::spawn(supervisor.run(std::time::Duration::from_secs(5), shutdown_rx.clone()));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        socket = %daemon.config.socket_path().display(),
        robot_port = daemon.config.robot_port,
        "orcd ready"
    );
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    let _ = shutdown_tx.send(true);
    graceful_drain(&daemon, &robots).await;
    lifecycle::shutdown(&daemon);

    info!("orcd stopped");
    Ok(())
}

/// Stop taking new dispatches is already implied by the tickers halting;
/// here we notify every RUNNING job's robot and give it
/// `graceful_shutdown_seconds` to acknowledge before force-cancelling
/// whatever is left (§5).
async fn graceful_drain(daemon: &lifecycle::Daemon, robots: &RobotChannels) {
    let (running, _) = daemon.engine.list_jobs(Some(JobStatus::Running), None, None, 1, u32::MAX);
    if running.is_empty() {
        return;
    }
    info!(count = running.len(), "notifying robots of in-flight jobs before shutdown");
    for job in &running {
        if let Some(robot_id) = job.assigned_robot_id {
            robot::push_cancel(robots, robot_id, job.id, "daemon shutting down".into()).await;
        }
    }

    tokio::time::sleep(daemon.config.engine.graceful_shutdown()).await;

    let (still_running, _) = daemon.engine.list_jobs(Some(JobStatus::Running), None, None, 1, u32::MAX);
    for job in still_running {
        if let Some(robot_id) = job.assigned_robot_id {
            warn!(job_id = %job.id, "force-cancelling job past graceful shutdown window");
            daemon.engine.finish_cancel(job.id, robot_id, "daemon shutdown grace period elapsed".into());
        }
    }
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (`orcd.log.1`, `.2`, `.3`).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`]. Best-effort:
/// failures are silently ignored so the daemon still starts.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(config: &DaemonConfig) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = config.log_path();
    let parent: PathBuf = log_path.parent().map(Path::to_path_buf).unwrap_or_else(|| config.log_dir.clone());
    std::fs::create_dir_all(&parent)?;

    let file_name = log_path.file_name().ok_or_else(|| {
        LifecycleError::CreateStateDir(log_path.clone(), std::io::Error::new(std::io::ErrorKind::InvalidInput, "log path has no file name"))
    })?;
    let file_appender = tracing_appender::rolling::never(&parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}
