// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orc` — the operator CLI for the orchestrator control plane. Talks to
//! `orcd` over the wire protocol only; never links the engine directly.

mod client;
mod commands;
mod env;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::DaemonClient;
use commands::{daemon, job, robot, schedule, trigger};
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "orc", version, about = "Operator CLI for the orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit, inspect, and manage jobs.
    Job(job::JobArgs),
    /// Register and inspect robots in the fleet.
    Robot(robot::RobotArgs),
    /// Manage recurring and one-shot schedules.
    Schedule(schedule::ScheduleArgs),
    /// Manage external triggers.
    Trigger(trigger::TriggerArgs),
    /// Inspect `orcd` itself.
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Daemon(args) = &cli.command {
        if let daemon::DaemonCommand::Status = args.command {
            return daemon::handle(daemon::DaemonCommand::Status, cli.output).await;
        }
    }

    let mut client = match DaemonClient::connect().await {
        Ok(client) => client,
        Err(e) if e.is_not_running() => {
            eprintln!("error: orcd is not running (no socket at {})", env::socket_path().display());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    match cli.command {
        Command::Job(args) => job::handle(args.command, &mut client, cli.output).await,
        Command::Robot(args) => robot::handle(args.command, &mut client, cli.output).await,
        Command::Schedule(args) => schedule::handle(args.command, &mut client, cli.output).await,
        Command::Trigger(args) => trigger::handle(args.command, &mut client, cli.output).await,
        Command::Daemon(_) => unreachable!("daemon status handled above"),
    }
}
