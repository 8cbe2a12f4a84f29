// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use orc_core::{Frequency, Priority, RobotId, ScheduleId};

use crate::client::DaemonClient;
use crate::output::OutputFormat;

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleCommand,
}

#[derive(Subcommand, Debug)]
pub enum ScheduleCommand {
    /// Create a recurring or one-shot schedule for a workflow.
    Create {
        workflow_id: String,
        /// Fire exactly once at this instant (RFC 3339). Mutually
        /// exclusive with `--every` and `--cron`.
        #[arg(long, conflicts_with_all = ["every", "cron"])]
        at: Option<DateTime<Utc>>,
        /// Fire every N seconds. Mutually exclusive with `--at` and `--cron`.
        #[arg(long, conflicts_with_all = ["at", "cron"])]
        every: Option<u64>,
        /// A 5- or 6-field cron expression. Requires `--timezone`.
        #[arg(long, conflicts_with_all = ["at", "every"])]
        cron: Option<String>,
        #[arg(long, default_value = "UTC")]
        timezone: String,
        #[arg(long)]
        robot: Option<String>,
        #[arg(long, default_value = "normal")]
        priority: Priority,
    },
    /// Delete a schedule.
    Delete { schedule_id: String },
    /// Enable or disable a schedule without deleting it.
    Toggle {
        schedule_id: String,
        #[arg(long)]
        enabled: bool,
    },
}

pub async fn handle(command: ScheduleCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        ScheduleCommand::Create { workflow_id, at, every, cron, timezone, robot, priority } => {
            let frequency = build_frequency(at, every, cron, timezone)?;
            let target_robot_id = robot.map(RobotId::from_string);
            let schedule = client.create_schedule(workflow_id, frequency, target_robot_id, priority).await?;
            crate::output::format_or_json(format, &schedule, |s| {
                println!("created {} for {}", s.schedule_id, s.workflow_id);
                if let Some(next) = s.next_fire_at {
                    println!("next fire: {next}");
                }
            })
        }
        ScheduleCommand::Delete { schedule_id } => {
            client.delete_schedule(ScheduleId::from_string(schedule_id.clone())).await?;
            println!("deleted {schedule_id}");
            Ok(())
        }
        ScheduleCommand::Toggle { schedule_id, enabled } => {
            client.toggle_schedule(ScheduleId::from_string(schedule_id.clone()), enabled).await?;
            println!("{} {schedule_id}", if enabled { "enabled" } else { "disabled" });
            Ok(())
        }
    }
}

fn build_frequency(at: Option<DateTime<Utc>>, every: Option<u64>, cron: Option<String>, timezone: String) -> Result<Frequency> {
    if let Some(at) = at {
        return Ok(Frequency::Once { at });
    }
    if let Some(period_secs) = every {
        return Ok(Frequency::Interval { period_secs });
    }
    if let Some(expression) = cron {
        return Ok(Frequency::Cron { expression, timezone });
    }
    anyhow::bail!("one of --at, --every, or --cron is required")
}
