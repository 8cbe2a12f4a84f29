// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin client over the control-plane wire protocol (§6.1). One request
//! per connection, matching how `orcd`'s listener reads a stream of
//! framed requests and replies in turn.

use orc_wire::{read_typed, write_typed, ProtocolError, Request, Response};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("orcd is not running (no socket at {0})")]
    NotRunning(std::path::PathBuf),
    #[error("connecting to orcd: {0}")]
    Connect(#[source] std::io::Error),
    #[error("orcd rejected the auth token")]
    Unauthenticated,
    #[error("request to orcd: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("orcd returned an unexpected response for this request")]
    UnexpectedResponse,
    #[error("{message}")]
    Remote { kind: orc_wire::ResponseErrorKind, message: String },
    #[error("request to orcd timed out")]
    Timeout,
}

impl ClientError {
    pub fn is_not_running(&self) -> bool {
        matches!(self, ClientError::NotRunning(_) | ClientError::Connect(_))
    }
}

enum Conn {
    Unix(UnixStream),
    Tcp(TcpStream),
}

/// A single connection to `orcd`'s control plane. Connections are not
/// pooled — the CLI opens one per invocation and the daemon is built to
/// expect exactly that (§6.1).
pub struct DaemonClient {
    conn: Conn,
}

impl DaemonClient {
    /// Connect over `$ORC_TCP_PORT` if set, otherwise the Unix socket under
    /// the state directory.
    pub async fn connect() -> Result<Self, ClientError> {
        if let Some((host, port)) = crate::env::tcp_addr() {
            return Self::connect_tcp(&host, port).await;
        }
        Self::connect_unix().await
    }

    async fn connect_unix() -> Result<Self, ClientError> {
        let path = crate::env::socket_path();
        let stream = UnixStream::connect(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound || e.kind() == std::io::ErrorKind::ConnectionRefused {
                ClientError::NotRunning(path.clone())
            } else {
                ClientError::Connect(e)
            }
        })?;
        Ok(Self { conn: Conn::Unix(stream) })
    }

    async fn connect_tcp(host: &str, port: u16) -> Result<Self, ClientError> {
        let mut stream = TcpStream::connect((host, port)).await.map_err(ClientError::Connect)?;
        #[derive(serde::Serialize)]
        struct Hello<'a> {
            token: &'a str,
        }
        let token = crate::env::auth_token().unwrap_or_default();
        write_typed(&mut stream, &Hello { token: &token }).await?;
        let ack: Response = read_typed(&mut stream).await?;
        if !matches!(ack, Response::Ok) {
            return Err(ClientError::Unauthenticated);
        }
        Ok(Self { conn: Conn::Tcp(stream) })
    }

    async fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        match &mut self.conn {
            Conn::Unix(stream) => Self::send_on(stream, request).await,
            Conn::Tcp(stream) => Self::send_on(stream, request).await,
        }
    }

    async fn send_on<S: AsyncRead + AsyncWrite + Unpin>(stream: &mut S, request: &Request) -> Result<Response, ClientError> {
        write_typed(stream, request).await?;
        let response = tokio::time::timeout(crate::env::request_timeout(), read_typed(stream))
            .await
            .map_err(|_| ClientError::Timeout)??;
        Ok(response)
    }

    fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { kind, message } => Err(ClientError::Remote { kind, message }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn metrics(&mut self) -> Result<orc_wire::StatisticsResponse, ClientError> {
        match self.send(&Request::Metrics).await? {
            Response::Metrics { stats } => Ok(*stats),
            other => Self::reject(other),
        }
    }
}

pub mod jobs {
    use super::*;
    use chrono::{DateTime, Utc};
    use orc_core::{JobId, JobStatus, Priority, RobotId};
    use std::collections::BTreeSet;

    impl DaemonClient {
        #[allow(clippy::too_many_arguments)]
        pub async fn submit_job(
            &mut self,
            workflow_id: String,
            workflow_document: serde_json::Value,
            parameters: serde_json::Value,
            priority: Priority,
            target_robot_id: Option<RobotId>,
            scheduled_time: Option<DateTime<Utc>>,
            timeout_secs: Option<u64>,
            check_duplicate: bool,
            required_tags: BTreeSet<String>,
            required_capabilities: BTreeSet<String>,
        ) -> Result<(JobId, JobStatus), ClientError> {
            let request = Request::SubmitJob {
                workflow_id,
                workflow_document,
                parameters,
                priority,
                target_robot_id,
                scheduled_time,
                timeout_secs,
                check_duplicate,
                required_tags,
                required_capabilities,
            };
            match self.send(&request).await? {
                Response::JobSubmitted { job_id, status } => Ok((job_id, status)),
                other => Self::reject(other),
            }
        }

        pub async fn cancel_job(&mut self, job_id: JobId, reason: String) -> Result<(), ClientError> {
            match self.send(&Request::CancelJob { job_id, reason }).await? {
                Response::Ok => Ok(()),
                other => Self::reject(other),
            }
        }

        pub async fn retry_job(&mut self, job_id: JobId) -> Result<(), ClientError> {
            match self.send(&Request::RetryJob { job_id }).await? {
                Response::Ok => Ok(()),
                other => Self::reject(other),
            }
        }

        pub async fn get_job(&mut self, job_id: JobId) -> Result<Option<orc_wire::JobSnapshot>, ClientError> {
            match self.send(&Request::GetJob { job_id }).await? {
                Response::Job { job } => Ok(job.map(|b| *b)),
                other => Self::reject(other),
            }
        }

        pub async fn list_jobs(
            &mut self,
            status: Option<JobStatus>,
            robot_id: Option<RobotId>,
            workflow_id: Option<String>,
            page: u32,
            page_size: u32,
        ) -> Result<(Vec<orc_wire::JobSnapshot>, u64), ClientError> {
            let request = Request::ListJobs { status, robot_id, workflow_id, page, page_size };
            match self.send(&request).await? {
                Response::Jobs { jobs, total } => Ok((jobs, total)),
                other => Self::reject(other),
            }
        }
    }
}

pub mod robots {
    use super::*;
    use orc_core::{RobotId, RobotStatus};
    use std::collections::BTreeSet;

    impl DaemonClient {
        pub async fn register_robot(
            &mut self,
            robot_id: RobotId,
            name: String,
            env: String,
            tags: BTreeSet<String>,
            caps: BTreeSet<String>,
            max: u32,
        ) -> Result<(), ClientError> {
            let request = Request::RegisterRobot { robot_id, name, env, tags, caps, max };
            match self.send(&request).await? {
                Response::Ok | Response::Robot { .. } => Ok(()),
                other => Self::reject(other),
            }
        }

        pub async fn unregister_robot(&mut self, robot_id: RobotId) -> Result<(), ClientError> {
            match self.send(&Request::UnregisterRobot { robot_id }).await? {
                Response::Ok => Ok(()),
                other => Self::reject(other),
            }
        }

        pub async fn list_robots(&mut self, status: Option<RobotStatus>) -> Result<Vec<orc_wire::RobotSnapshot>, ClientError> {
            match self.send(&Request::ListRobots { status }).await? {
                Response::Robots { robots } => Ok(robots),
                other => Self::reject(other),
            }
        }
    }
}

pub mod schedules {
    use super::*;
    use orc_core::{Frequency, Priority, RobotId, ScheduleId};

    impl DaemonClient {
        pub async fn create_schedule(
            &mut self,
            workflow_id: String,
            frequency: Frequency,
            target_robot_id: Option<RobotId>,
            priority: Priority,
        ) -> Result<orc_wire::ScheduleSnapshot, ClientError> {
            let request = Request::CreateSchedule { workflow_id, frequency, target_robot_id, priority };
            match self.send(&request).await? {
                Response::Schedule { schedule } => Ok(*schedule),
                other => Self::reject(other),
            }
        }

        pub async fn delete_schedule(&mut self, schedule_id: ScheduleId) -> Result<(), ClientError> {
            match self.send(&Request::DeleteSchedule { schedule_id }).await? {
                Response::Ok => Ok(()),
                other => Self::reject(other),
            }
        }

        pub async fn toggle_schedule(&mut self, schedule_id: ScheduleId, enabled: bool) -> Result<(), ClientError> {
            match self.send(&Request::ToggleSchedule { schedule_id, enabled }).await? {
                Response::Ok => Ok(()),
                other => Self::reject(other),
            }
        }
    }
}

pub mod triggers {
    use super::*;
    use orc_core::{TriggerConfig, TriggerId, TriggerKind};

    impl DaemonClient {
        pub async fn register_trigger(
            &mut self,
            kind: TriggerKind,
            config: TriggerConfig,
            workflow_id: String,
        ) -> Result<orc_wire::TriggerSnapshot, ClientError> {
            let request = Request::RegisterTrigger { kind, config, workflow_id };
            match self.send(&request).await? {
                Response::Trigger { trigger } => Ok(*trigger),
                other => Self::reject(other),
            }
        }

        pub async fn unregister_trigger(&mut self, trigger_id: TriggerId) -> Result<(), ClientError> {
            match self.send(&Request::UnregisterTrigger { trigger_id }).await? {
                Response::Ok => Ok(()),
                other => Self::reject(other),
            }
        }

        pub async fn enable_trigger(&mut self, trigger_id: TriggerId) -> Result<(), ClientError> {
            match self.send(&Request::EnableTrigger { trigger_id }).await? {
                Response::Ok => Ok(()),
                other => Self::reject(other),
            }
        }

        pub async fn disable_trigger(&mut self, trigger_id: TriggerId) -> Result<(), ClientError> {
            match self.send(&Request::DisableTrigger { trigger_id }).await? {
                Response::Ok => Ok(()),
                other => Self::reject(other),
            }
        }

        pub async fn fire_trigger(&mut self, trigger_id: TriggerId, payload: serde_json::Value) -> Result<(), ClientError> {
            match self.send(&Request::FireTriggerManually { trigger_id, payload }).await? {
                Response::Ok => Ok(()),
                other => Self::reject(other),
            }
        }
    }
}
