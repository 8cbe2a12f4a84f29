// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level errors: startup/lifecycle failures and per-connection
//! protocol errors. Engine-level failures are handled entirely inside
//! [`orc_engine::Engine::handle_request`] and never surface here.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("failed to create state directory {0}: {1}")]
    CreateStateDir(PathBuf, #[source] std::io::Error),

    #[error("another orcd is already running (failed to lock {0})")]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("failed to bind control socket at {0}: {1}")]
    BindControl(PathBuf, #[source] std::io::Error),

    #[error("failed to bind robot listener on port {0}: {1}")]
    BindRobot(u16, #[source] std::io::Error),

    #[error("repository error: {0}")]
    Repository(#[from] orc_storage::RepositoryError),

    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Protocol(#[from] orc_wire::ProtocolError),
    #[error("client sent no request before the IPC timeout elapsed")]
    Timeout,
    #[error("TCP caller did not authenticate")]
    Unauthenticated,
}
