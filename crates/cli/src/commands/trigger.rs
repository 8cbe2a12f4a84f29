// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use orc_core::{TriggerConfig, TriggerId, TriggerKind};

use crate::client::DaemonClient;
use crate::output::OutputFormat;

#[derive(Args, Debug)]
pub struct TriggerArgs {
    #[command(subcommand)]
    pub command: TriggerCommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TriggerKindArg {
    Manual,
    Scheduled,
    Webhook,
    File,
    Email,
    Form,
    Chat,
    WorkflowCall,
}

impl From<TriggerKindArg> for TriggerKind {
    fn from(arg: TriggerKindArg) -> Self {
        match arg {
            TriggerKindArg::Manual => TriggerKind::Manual,
            TriggerKindArg::Scheduled => TriggerKind::Scheduled,
            TriggerKindArg::Webhook => TriggerKind::Webhook,
            TriggerKindArg::File => TriggerKind::File,
            TriggerKindArg::Email => TriggerKind::Email,
            TriggerKindArg::Form => TriggerKind::Form,
            TriggerKindArg::Chat => TriggerKind::Chat,
            TriggerKindArg::WorkflowCall => TriggerKind::WorkflowCall,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum TriggerCommand {
    /// Register a trigger bound to a workflow.
    Register {
        workflow_id: String,
        #[arg(long)]
        kind: TriggerKindArg,
        /// URL path, for `--kind webhook`.
        #[arg(long)]
        webhook_path: Option<String>,
        /// Filesystem path to watch, for `--kind file`.
        #[arg(long)]
        watch_path: Option<String>,
        /// Mailbox identifier, for `--kind email`.
        #[arg(long)]
        mailbox: Option<String>,
        /// Chat channel identifier, for `--kind chat`.
        #[arg(long)]
        chat_channel: Option<String>,
        /// Bound schedule, for `--kind scheduled`.
        #[arg(long)]
        schedule_id: Option<String>,
    },
    /// Remove a trigger.
    Unregister { trigger_id: String },
    Enable { trigger_id: String },
    Disable { trigger_id: String },
    /// Fire a trigger as if its stimulus had just occurred.
    Fire {
        trigger_id: String,
        /// JSON payload passed through as the job's parameters.
        #[arg(long, default_value = "{}")]
        payload: String,
    },
}

pub async fn handle(command: TriggerCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        TriggerCommand::Register { workflow_id, kind, webhook_path, watch_path, mailbox, chat_channel, schedule_id } => {
            let kind: TriggerKind = kind.into();
            let config = build_config(kind, webhook_path, watch_path, mailbox, chat_channel, schedule_id)?;
            let trigger = client.register_trigger(kind, config, workflow_id).await?;
            crate::output::format_or_json(format, &trigger, |t| {
                println!("registered {} ({}) for {}", t.trigger_id, t.kind, t.workflow_id);
            })
        }
        TriggerCommand::Unregister { trigger_id } => {
            client.unregister_trigger(TriggerId::from_string(trigger_id.clone())).await?;
            println!("unregistered {trigger_id}");
            Ok(())
        }
        TriggerCommand::Enable { trigger_id } => {
            client.enable_trigger(TriggerId::from_string(trigger_id.clone())).await?;
            println!("enabled {trigger_id}");
            Ok(())
        }
        TriggerCommand::Disable { trigger_id } => {
            client.disable_trigger(TriggerId::from_string(trigger_id.clone())).await?;
            println!("disabled {trigger_id}");
            Ok(())
        }
        TriggerCommand::Fire { trigger_id, payload } => {
            let payload: serde_json::Value = serde_json::from_str(&payload)?;
            client.fire_trigger(TriggerId::from_string(trigger_id.clone()), payload).await?;
            println!("fired {trigger_id}");
            Ok(())
        }
    }
}

fn build_config(
    kind: TriggerKind,
    webhook_path: Option<String>,
    watch_path: Option<String>,
    mailbox: Option<String>,
    chat_channel: Option<String>,
    schedule_id: Option<String>,
) -> Result<TriggerConfig> {
    let config = match kind {
        TriggerKind::Webhook => TriggerConfig { webhook_path: Some(require(webhook_path, "--webhook-path")?), ..Default::default() },
        TriggerKind::File => TriggerConfig { watch_path: Some(require(watch_path, "--watch-path")?), ..Default::default() },
        TriggerKind::Email => TriggerConfig { mailbox: Some(require(mailbox, "--mailbox")?), ..Default::default() },
        TriggerKind::Chat => TriggerConfig { chat_channel: Some(require(chat_channel, "--chat-channel")?), ..Default::default() },
        TriggerKind::Scheduled => TriggerConfig { schedule_id: Some(orc_core::ScheduleId::from_string(require(schedule_id, "--schedule-id")?)), ..Default::default() },
        TriggerKind::Manual | TriggerKind::Form | TriggerKind::WorkflowCall => TriggerConfig::default(),
    };
    Ok(config)
}

fn require(value: Option<String>, flag: &str) -> Result<String> {
    value.ok_or_else(|| anyhow::anyhow!("{flag} is required for this trigger kind"))
}
