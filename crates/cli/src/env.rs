// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level defaults the CLI reads directly rather than linking
//! against `orc-daemon` — the same `$ORC_*` variables the daemon honors
//! (§6.4), kept independent so the client binary has no dependency on the
//! daemon's process/lifecycle code.

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

pub fn socket_path() -> PathBuf {
    state_dir().join("orcd.sock")
}

/// `$ORC_TCP_PORT` / `$ORC_HOST` — when set, the CLI talks TCP instead of
/// the Unix socket and must present `$ORC_AUTH_TOKEN` via `Hello`.
pub fn tcp_addr() -> Option<(String, u16)> {
    let port: u16 = std::env::var("ORC_TCP_PORT").ok()?.parse().ok()?;
    let host = std::env::var("ORC_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    Some((host, port))
}

pub fn auth_token() -> Option<String> {
    std::env::var("ORC_AUTH_TOKEN").ok().filter(|s| !s.is_empty())
}

/// How long the client waits for a response before giving up.
pub fn request_timeout() -> Duration {
    let ms = std::env::var("ORC_IPC_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(5_000);
    Duration::from_millis(ms)
}
