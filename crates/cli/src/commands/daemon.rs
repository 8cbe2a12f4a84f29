// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::OutputFormat;

#[derive(Args, Debug)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Report whether `orcd` is reachable and show its queue/fleet metrics.
    Status,
}

pub async fn handle(command: DaemonCommand, format: OutputFormat) -> Result<()> {
    match command {
        DaemonCommand::Status => status(format).await,
    }
}

async fn status(format: OutputFormat) -> Result<()> {
    let mut client = match DaemonClient::connect().await {
        Ok(client) => client,
        Err(e) if e.is_not_running() => {
            print_not_running();
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let stats = client.metrics().await?;
    crate::output::format_or_json(format, &stats, |stats| {
        println!("orcd: running");
        println!();
        println!("queue depth by status:");
        for (status, count) in &stats.queue_depth_by_status {
            println!("  {status:<10} {count}");
        }
        println!();
        println!("robots by status:");
        for (status, count) in &stats.robots_by_status {
            println!("  {status:<10} {count}");
        }
    })
}

fn print_not_running() {
    println!("orcd: not running");
    println!("(no socket at {}; start it with `orcd &`)", crate::env::socket_path().display());
}
