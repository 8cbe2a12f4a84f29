// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External trigger registry: translates outside stimuli into job enqueues.

use crate::schedule::ScheduleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a trigger.
    pub struct TriggerId("trg-");
}

/// Kind of external stimulus a trigger reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Fired only by an explicit `FireManually` call.
    Manual,
    /// Delegates to the scheduler; one schedule per trigger.
    Scheduled,
    /// A URL path bound to the trigger; an HTTP POST body becomes `parameters`.
    Webhook,
    /// Fires when a watched path changes on disk.
    File,
    /// Fires when a poller observes a new message in a mailbox.
    Email,
    /// Fires on submission of a bound web form.
    Form,
    /// Fires on a message in a bound chat channel.
    Chat,
    /// Fires when another workflow calls this one as a sub-workflow.
    WorkflowCall,
}

crate::simple_display! {
    TriggerKind {
        Manual => "manual",
        Scheduled => "scheduled",
        Webhook => "webhook",
        File => "file",
        Email => "email",
        Form => "form",
        Chat => "chat",
        WorkflowCall => "workflow_call",
    }
}

/// Per-kind configuration. Only the fields relevant to `kind` are
/// meaningful; the orchestrator does not cross-validate unused fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailbox: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<ScheduleId>,
}

/// A registered external trigger bound to a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub kind: TriggerKind,
    pub config: TriggerConfig,
    pub scenario_id: Option<String>,
    pub workflow_id: String,
    pub enabled: bool,
    pub fire_count: u64,
    pub last_fire_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Trigger {
    pub fn new(
        id: TriggerId,
        kind: TriggerKind,
        config: TriggerConfig,
        workflow_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            config,
            scenario_id: None,
            workflow_id: workflow_id.into(),
            enabled: true,
            fire_count: 0,
            last_fire_at: None,
            created_at: now,
        }
    }

    /// Whether a stimulus should be translated into an enqueue right now.
    /// Disabled triggers silently drop stimuli (§4.6).
    pub fn accepts_stimulus(&self) -> bool {
        self.enabled
    }

    /// Record an actual enqueue. Statistics only move on real fires, never
    /// on dropped (disabled) stimuli.
    pub fn record_fire(&mut self, now: DateTime<Utc>) {
        self.fire_count += 1;
        self.last_fire_at = Some(now);
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

crate::builder! {
    pub struct TriggerBuilder => Trigger {
        into {
            workflow_id: String = "wf-1",
        }
        set {
            kind: TriggerKind = TriggerKind::Manual,
            config: TriggerConfig = TriggerConfig::default(),
            enabled: bool = true,
            fire_count: u64 = 0,
        }
        option {
            scenario_id: String = None,
            last_fire_at: DateTime<Utc> = None,
        }
        computed {
            id: TriggerId = TriggerId::new(),
            created_at: DateTime<Utc> = Utc::now(),
        }
    }
}
