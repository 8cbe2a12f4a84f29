// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level defaults read from the environment. Everything here has a
//! sane default so the daemon runs unconfigured; explicit TOML config
//! (§6.4) always takes precedence over these.

use std::path::PathBuf;
use std::time::Duration;

/// Root state directory: `$ORC_STATE_DIR`, then `$XDG_STATE_HOME/orc`, then
/// `~/.local/state/orc`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ORC_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("orc");
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".local").join("state").join("orc")
}

/// How long the control listener waits for a client to send a full request
/// before dropping the connection. `$ORC_IPC_TIMEOUT_MS`, default 5s.
pub fn ipc_timeout() -> Duration {
    let ms = std::env::var("ORC_IPC_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(5_000);
    Duration::from_millis(ms)
}

/// Optional TCP port for the control listener, in addition to the trusted
/// Unix socket. `$ORC_TCP_PORT`.
pub fn tcp_port() -> Option<u16> {
    std::env::var("ORC_TCP_PORT").ok().and_then(|v| v.parse().ok())
}

/// Shared secret TCP callers must present via `Hello`. `$ORC_AUTH_TOKEN`,
/// empty/unset means TCP auth is disabled (Unix-only deployments).
pub fn auth_token() -> Option<String> {
    std::env::var("ORC_AUTH_TOKEN").ok().filter(|s| !s.is_empty())
}

/// Override for the robot wire listener's bind address. `$ORC_ROBOT_BIND`.
pub fn robot_bind() -> Option<String> {
    std::env::var("ORC_ROBOT_BIND").ok().filter(|s| !s.is_empty())
}

/// Override for how often background tickers (dispatch, sweepers, scheduler)
/// run, in milliseconds. `$ORC_TICK_MS`.
pub fn tick_override_ms() -> Option<u64> {
    std::env::var("ORC_TICK_MS").ok().and_then(|v| v.parse().ok())
}
