// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use orc_core::{JobId, JobStatus, Priority, RobotId};

use crate::client::DaemonClient;
use crate::output::{format_time_ago, handle_list, OutputFormat};

#[derive(Args, Debug)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand, Debug)]
pub enum JobCommand {
    /// Submit a workflow document to the queue.
    Submit {
        /// The workflow identifier recorded against this job.
        workflow_id: String,
        /// Path to the workflow document (JSON). Required.
        #[arg(long)]
        document: PathBuf,
        /// `key=value` parameter pairs, repeatable. Values are parsed as
        /// JSON when possible, otherwise kept as strings.
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        #[arg(long, default_value = "normal")]
        priority: Priority,
        /// Pin the job to a specific robot instead of the scheduler's pick.
        #[arg(long)]
        robot: Option<String>,
        /// Delay the job until this instant (RFC 3339).
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Reject the submission if an equivalent job is already queued.
        #[arg(long)]
        check_duplicate: bool,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long = "capability")]
        capabilities: Vec<String>,
    },
    /// Request cancellation of a queued or running job.
    Cancel {
        job_id: String,
        #[arg(long, default_value = "cancelled by operator")]
        reason: String,
    },
    /// Re-enqueue a job that ended in FAILED or TIMEOUT.
    Retry { job_id: String },
    /// Show a single job.
    Get { job_id: String },
    /// List jobs, optionally filtered.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        robot: Option<String>,
        #[arg(long)]
        workflow_id: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        page_size: u32,
    },
}

pub async fn handle(command: JobCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        JobCommand::Submit { workflow_id, document, params, priority, robot, at, timeout_secs, check_duplicate, tags, capabilities } => {
            let raw = std::fs::read_to_string(&document).with_context(|| format!("reading {}", document.display()))?;
            let workflow_document: serde_json::Value = serde_json::from_str(&raw).with_context(|| format!("parsing {} as JSON", document.display()))?;
            let parameters = parse_params(&params)?;
            let target_robot_id = robot.map(RobotId::from_string);
            let required_tags: BTreeSet<String> = tags.into_iter().collect();
            let required_capabilities: BTreeSet<String> = capabilities.into_iter().collect();
            let (job_id, status) = client
                .submit_job(workflow_id, workflow_document, parameters, priority, target_robot_id, at, timeout_secs, check_duplicate, required_tags, required_capabilities)
                .await?;
            format_or_json_submit(format, &job_id, status)
        }
        JobCommand::Cancel { job_id, reason } => {
            client.cancel_job(JobId::from_string(job_id.clone()), reason).await?;
            println!("cancelling {job_id}");
            Ok(())
        }
        JobCommand::Retry { job_id } => {
            client.retry_job(JobId::from_string(job_id.clone())).await?;
            println!("retrying {job_id}");
            Ok(())
        }
        JobCommand::Get { job_id } => {
            let job = client.get_job(JobId::from_string(job_id.clone())).await?;
            let Some(job) = job else {
                bail!("no such job: {job_id}");
            };
            crate::output::format_or_json(format, &job, |j| print_job(j))
        }
        JobCommand::List { status, robot, workflow_id, page, page_size } => {
            let status = status.map(|s| parse_status(&s)).transpose()?;
            let robot_id = robot.map(RobotId::from_string);
            let (jobs, total) = client.list_jobs(status, robot_id, workflow_id, page, page_size).await?;
            handle_list(format, &jobs, "no jobs", |jobs| {
                for job in jobs {
                    print_job_line(job);
                }
                println!("({total} total)");
            })
        }
    }
}

fn format_or_json_submit(format: OutputFormat, job_id: &JobId, status: JobStatus) -> Result<()> {
    #[derive(serde::Serialize)]
    struct Submitted<'a> {
        job_id: &'a JobId,
        status: JobStatus,
    }
    crate::output::format_or_json(format, &Submitted { job_id, status }, |s| {
        println!("submitted {} ({})", s.job_id, s.status);
    })
}

fn print_job(job: &orc_wire::JobSnapshot) {
    println!("job_id:           {}", job.job_id);
    println!("workflow:         {} ({})", job.workflow_name, job.workflow_id);
    println!("priority:         {}", job.priority);
    println!("status:           {}", job.status);
    if let Some(robot_id) = job.assigned_robot_id {
        println!("assigned_robot:   {robot_id}");
    }
    println!("progress:         {}%", job.progress);
    if let Some(node) = &job.current_node {
        println!("current_node:     {node}");
    }
    println!("retry_count:      {}", job.retry_count);
    println!("created:          {}", format_time_ago(job.created_at));
    if let Some(started) = job.started_at {
        println!("started:          {}", format_time_ago(started));
    }
    if let Some(completed) = job.completed_at {
        println!("completed:        {}", format_time_ago(completed));
    }
}

fn print_job_line(job: &orc_wire::JobSnapshot) {
    let robot = job.assigned_robot_id.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
    println!("{:<14} {:<10} {:<8} {:<3}% {:<14} {}", job.job_id.short(8), job.status, job.priority, job.progress, robot, job.workflow_id);
}

fn parse_status(raw: &str) -> Result<JobStatus> {
    let lowered = raw.to_ascii_lowercase();
    let status = match lowered.as_str() {
        "pending" => JobStatus::Pending,
        "queued" => JobStatus::Queued,
        "running" => JobStatus::Running,
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        "timeout" => JobStatus::Timeout,
        "cancelled" | "canceled" => JobStatus::Cancelled,
        other => bail!("unknown job status {other:?}"),
    };
    Ok(status)
}

fn parse_params(pairs: &[String]) -> Result<serde_json::Value> {
    let mut map = serde_json::Map::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').with_context(|| format!("expected KEY=VALUE, got {pair:?}"))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(serde_json::Value::Object(map))
}
