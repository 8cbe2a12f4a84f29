// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use orc_core::{RobotId, RobotStatus};

use crate::client::DaemonClient;
use crate::output::{format_time_ago, handle_list, OutputFormat};

#[derive(Args, Debug)]
pub struct RobotArgs {
    #[command(subcommand)]
    pub command: RobotCommand,
}

#[derive(Subcommand, Debug)]
pub enum RobotCommand {
    /// Register a robot with the fleet.
    Register {
        robot_id: String,
        name: String,
        #[arg(long, default_value = "production")]
        env: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long = "capability")]
        capabilities: Vec<String>,
        #[arg(long, default_value_t = 1)]
        max: u32,
    },
    /// Remove a robot from the fleet.
    Unregister { robot_id: String },
    /// List registered robots.
    List {
        #[arg(long)]
        status: Option<String>,
    },
}

pub async fn handle(command: RobotCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        RobotCommand::Register { robot_id, name, env, tags, capabilities, max } => {
            let id = RobotId::from_string(robot_id.clone());
            let tags: BTreeSet<String> = tags.into_iter().collect();
            let capabilities: BTreeSet<String> = capabilities.into_iter().collect();
            client.register_robot(id, name, env, tags, capabilities, max).await?;
            println!("registered {robot_id}");
            Ok(())
        }
        RobotCommand::Unregister { robot_id } => {
            client.unregister_robot(RobotId::from_string(robot_id.clone())).await?;
            println!("unregistered {robot_id}");
            Ok(())
        }
        RobotCommand::List { status } => {
            let status = status.map(|s| parse_status(&s)).transpose()?;
            let robots = client.list_robots(status).await?;
            handle_list(format, &robots, "no robots", |robots| {
                for robot in robots {
                    println!(
                        "{:<14} {:<16} {:<8} {}/{:<3} {}",
                        robot.robot_id.short(8),
                        robot.name,
                        robot.status,
                        robot.current_jobs,
                        robot.max_concurrent_jobs,
                        format_time_ago(robot.last_heartbeat_at)
                    );
                }
            })
        }
    }
}

fn parse_status(raw: &str) -> Result<RobotStatus> {
    let status = match raw.to_ascii_lowercase().as_str() {
        "online" => RobotStatus::Online,
        "busy" => RobotStatus::Busy,
        "offline" => RobotStatus::Offline,
        "disabled" => RobotStatus::Disabled,
        other => bail!("unknown robot status {other:?}"),
    };
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_accepts_known_variants() {
        assert_eq!(parse_status("online").unwrap(), RobotStatus::Online);
        assert_eq!(parse_status("Disabled").unwrap(), RobotStatus::Disabled);
    }

    #[test]
    fn parse_status_rejects_unknown() {
        assert!(parse_status("hibernating").is_err());
    }
}
