// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed orchestrator configuration (§6.4). The daemon crate owns the
//! surrounding process config (bind addresses, auth, logging) and embeds
//! this structure for the core's own tunables.

use serde::{Deserialize, Serialize};

/// Strategy the dispatcher uses to pick among eligible robots (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancingStrategy {
    #[default]
    RoundRobin,
    LeastLoaded,
    Random,
    Affinity,
}

crate::simple_display! {
    LoadBalancingStrategy {
        RoundRobin => "round_robin",
        LeastLoaded => "least_loaded",
        Random => "random",
        Affinity => "affinity",
    }
}

/// Orchestrator-core tunables, deserialised from the host process's
/// configuration file (TOML).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub dispatch_interval_seconds: u64,
    pub timeout_check_interval_seconds: u64,
    pub stale_robot_timeout_seconds: u64,
    pub default_job_timeout_seconds: u64,
    pub dedup_window_seconds: u64,
    pub load_balancing_strategy: LoadBalancingStrategy,
    pub max_queue_depth: usize,
    pub graceful_shutdown_seconds: u64,
    pub heartbeat_interval_seconds: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            dispatch_interval_seconds: 5,
            timeout_check_interval_seconds: 30,
            stale_robot_timeout_seconds: 60,
            default_job_timeout_seconds: crate::job::DEFAULT_JOB_TIMEOUT_SECONDS,
            dedup_window_seconds: 300,
            load_balancing_strategy: LoadBalancingStrategy::RoundRobin,
            max_queue_depth: 100_000,
            graceful_shutdown_seconds: 60,
            heartbeat_interval_seconds: 10,
        }
    }
}

impl OrchestratorConfig {
    pub fn dispatch_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.dispatch_interval_seconds)
    }

    pub fn timeout_check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_check_interval_seconds)
    }

    pub fn stale_robot_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_robot_timeout_seconds as i64)
    }

    pub fn dedup_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.dedup_window_seconds as i64)
    }

    pub fn graceful_shutdown(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.graceful_shutdown_seconds)
    }

    /// Parse from a TOML document; unspecified fields fall back to defaults
    /// because the struct is `#[serde(default)]`.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
