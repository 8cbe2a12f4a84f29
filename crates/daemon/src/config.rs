// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level configuration (§6.4): the process surface around the
//! engine's own [`OrchestratorConfig`] — bind addresses, auth, logging, and
//! the on-disk layout under the state directory.

use orc_core::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Daemon configuration, loadable from a TOML file and overridable by
/// environment variables (§6.4). [`OrchestratorConfig`] is embedded
/// verbatim — the daemon never re-derives the engine's own tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Engine tunables: dispatch interval, timeouts, load-balancing, etc.
    pub engine: OrchestratorConfig,
    /// TCP port for the robot wire listener.
    pub robot_port: u16,
    /// Optional TCP port for the control plane, guarded by `auth_token`.
    pub control_tcp_port: Option<u16>,
    /// Shared secret TCP control-plane callers must present. `None`
    /// disables TCP control access entirely (Unix-only).
    pub auth_token: Option<String>,
    /// Directory for `orcd.log` and rotated companions.
    pub log_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"` or `"orc_daemon=debug,warn"`.
    pub log_level: String,
    /// Root state directory: socket, lock file, PID file, snapshot.
    pub state_dir: PathBuf,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let state_dir = crate::env::state_dir();
        Self {
            engine: OrchestratorConfig::default(),
            robot_port: 7410,
            control_tcp_port: crate::env::tcp_port(),
            auth_token: crate::env::auth_token(),
            log_dir: state_dir.join("logs"),
            log_level: "info".to_string(),
            state_dir,
        }
    }
}

impl DaemonConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load from `path` if it exists, falling back to [`DaemonConfig::default`]
    /// otherwise. Environment overrides (`$ORC_TCP_PORT`, `$ORC_AUTH_TOKEN`,
    /// `$ORC_ROBOT_BIND`) are applied on top either way.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            Self::from_toml_str(&text)?
        } else {
            Self::default()
        };
        if let Some(port) = crate::env::tcp_port() {
            config.control_tcp_port = Some(port);
        }
        if let Some(token) = crate::env::auth_token() {
            config.auth_token = Some(token);
        }
        Ok(config)
    }

    pub fn socket_path(&self) -> PathBuf {
        self.state_dir.join("orcd.sock")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("orcd.pid")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.state_dir.join("snapshot.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join("orcd.log")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_binds_unix_only() {
        let config = DaemonConfig::default();
        assert!(config.control_tcp_port.is_none() || config.auth_token.is_some() || std::env::var("ORC_TCP_PORT").is_ok());
        assert_eq!(config.robot_port, 7410);
    }

    #[test]
    fn from_toml_str_overrides_defaults() {
        let config = DaemonConfig::from_toml_str(
            r#"
            robot_port = 9000
            log_level = "debug"
            state_dir = "/tmp/orc-test"

            [engine]
            max_queue_depth = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.robot_port, 9000);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.engine.max_queue_depth, 10);
    }

    #[test]
    fn derived_paths_sit_under_state_dir() {
        let mut config = DaemonConfig::default();
        config.state_dir = PathBuf::from("/tmp/orc-test");
        assert_eq!(config.socket_path(), PathBuf::from("/tmp/orc-test/orcd.sock"));
        assert_eq!(config.lock_path(), PathBuf::from("/tmp/orc-test/orcd.pid"));
    }
}
