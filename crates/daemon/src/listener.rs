// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The control-plane listener (§6.1): a trusted Unix socket, plus an
//! optional TCP listener gated behind an auth-token handshake, both
//! dispatching through [`Engine::handle_request`].

use crate::error::{ConnectionError, LifecycleError};
use crate::robot::RobotChannels;
use orc_core::SystemClock;
use orc_engine::Engine;
use orc_wire::{read_typed, write_typed, Request, Response};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream, UnixListener};
use tracing::{info, warn};

/// Shared, read-only context every accepted connection needs.
pub struct ListenCtx {
    pub engine: Arc<Engine<SystemClock>>,
    pub robots: Arc<RobotChannels>,
    pub auth_token: Option<String>,
    pub ipc_timeout: std::time::Duration,
    /// How long a RUNNING cancel waits for the robot's `JobCancelled` ack
    /// before the engine force-cancels it outright (§4.2).
    pub cancel_grace: std::time::Duration,
}

/// Where a connection came from, which decides whether it must authenticate.
enum ConnectionSource {
    /// The Unix socket: file permissions are the trust boundary.
    Unix,
    /// TCP: requires a `Hello { token }` handshake matching `auth_token`.
    Tcp,
}

pub struct Listener {
    unix: UnixListener,
    tcp: Option<TcpListener>,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub async fn bind(socket_path: &PathBuf, tcp_port: Option<u16>, ctx: Arc<ListenCtx>) -> Result<Self, LifecycleError> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path).map_err(|e| LifecycleError::BindControl(socket_path.clone(), e))?;
        }
        let unix = UnixListener::bind(socket_path).map_err(|e| LifecycleError::BindControl(socket_path.clone(), e))?;
        let tcp = match tcp_port {
            Some(port) => Some(TcpListener::bind(("0.0.0.0", port)).await.map_err(|e| LifecycleError::BindControl(socket_path.clone(), e))?),
            None => None,
        };
        Ok(Self { unix, tcp, ctx })
    }

    /// Accept connections until the process is asked to shut down.
    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            tokio::select! {
                accepted = self.unix.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            let ctx = self.ctx.clone();
                            tokio::spawn(async move {
                                let (read_half, write_half) = stream.into_split();
                                handle_connection(read_half, write_half, ConnectionSource::Unix, ctx).await;
                            });
                        }
                        Err(e) => warn!(error = %e, "control socket accept failed"),
                    }
                }
                accepted = accept_tcp(self.tcp.as_ref()) => {
                    match accepted {
                        Ok((stream, addr)) => {
                            info!(%addr, "control-plane TCP connection accepted");
                            let ctx = self.ctx.clone();
                            tokio::spawn(async move {
                                let (read_half, write_half) = stream.into_split();
                                handle_connection(read_half, write_half, ConnectionSource::Tcp, ctx).await;
                            });
                        }
                        Err(e) => warn!(error = %e, "control TCP accept failed"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("control listener stopping");
                    return;
                }
            }
        }
    }
}

/// Resolves to the next TCP connection, or never resolves when no TCP
/// listener is configured — keeping it out of the `select!` rotation
/// without a busy-poll.
async fn accept_tcp(tcp: Option<&TcpListener>) -> std::io::Result<(TcpStream, std::net::SocketAddr)> {
    match tcp {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}

async fn handle_connection<R, W>(mut reader: R, mut writer: W, source: ConnectionSource, ctx: Arc<ListenCtx>)
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    if let ConnectionSource::Tcp = source {
        if authenticate(&mut reader, &mut writer, &ctx).await.is_err() {
            return;
        }
    }

    loop {
        let request: Request = match tokio::time::timeout(ctx.ipc_timeout, read_typed(&mut reader)).await {
            Ok(Ok(request)) => request,
            Ok(Err(orc_wire::ProtocolError::ConnectionClosed)) => return,
            Ok(Err(e)) => {
                warn!(error = %e, "control connection protocol error");
                return;
            }
            Err(_) => {
                warn!("control connection idle past IPC timeout");
                return;
            }
        };

        let response = dispatch(&ctx, request).await;
        if write_typed(&mut writer, &response).await.is_err() {
            return;
        }
    }
}

/// Routes most requests straight through [`Engine::handle_request`]. Cancel
/// is special: a RUNNING job needs a `JobCancel` pushed to its robot, and a
/// grace-period timer that force-cancels the job if no ack arrives in time.
async fn dispatch(ctx: &ListenCtx, request: Request) -> Response {
    let Request::CancelJob { job_id, reason } = request else {
        return ctx.engine.handle_request(request);
    };

    match ctx.engine.cancel_job(job_id, reason.clone()) {
        Ok(orc_engine::CancelOutcome::Cancelled(_)) => Response::Ok,
        Ok(orc_engine::CancelOutcome::AwaitingRobotAck(job)) => {
            let Some(robot_id) = job.assigned_robot_id else {
                return Response::Ok;
            };
            let engine = ctx.engine.clone();
            let robots = ctx.robots.clone();
            let grace = ctx.cancel_grace;
            tokio::spawn(async move {
                crate::robot::push_cancel(&robots, robot_id, job_id, reason).await;
                tokio::time::sleep(grace).await;
                if engine.get_job(job_id).map(|j| !j.is_terminal()).unwrap_or(false) {
                    engine.finish_cancel(job_id, robot_id, "cancel grace period elapsed".into());
                }
            });
            Response::Ok
        }
        Err(e) => {
            warn!(error = %e, "cancel_job failed");
            Response::Error { kind: e.response_kind(), message: e.to_string() }
        }
    }
}

/// TCP-only handshake: the first frame must be `Hello` carrying the shared
/// secret. Unauthenticated or mismatched callers are disconnected without a
/// reply, so a port scan can't distinguish "wrong token" from "not orcd".
async fn authenticate<R, W>(reader: &mut R, writer: &mut W, ctx: &ListenCtx) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(expected) = &ctx.auth_token else {
        return Err(ConnectionError::Unauthenticated);
    };
    #[derive(serde::Deserialize)]
    struct Hello {
        token: String,
    }
    let hello: Hello = read_typed(reader).await?;
    if &hello.token != expected {
        return Err(ConnectionError::Unauthenticated);
    }
    write_typed(writer, &Response::Ok).await?;
    Ok(())
}

/// Only reachable from a `UnixStream`/`TcpStream` split, kept generic so
/// tests can drive it over an in-memory duplex pipe.
pub async fn handle_connection_for_test<R, W>(reader: R, writer: W, ctx: Arc<ListenCtx>)
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    handle_connection(reader, writer, ConnectionSource::Unix, ctx).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_core::OrchestratorConfig;
    use orc_storage::InMemoryRepository;
    use tokio::io::duplex;

    fn ctx() -> Arc<ListenCtx> {
        let engine = Engine::new(Arc::new(InMemoryRepository::new()), SystemClock, &OrchestratorConfig::default());
        Arc::new(ListenCtx {
            engine: Arc::new(engine),
            robots: Arc::new(RobotChannels::new()),
            auth_token: None,
            ipc_timeout: std::time::Duration::from_secs(5),
            cancel_grace: std::time::Duration::from_secs(30),
        })
    }

    #[tokio::test]
    async fn unix_path_round_trips_a_request_without_auth() {
        let (client, server) = duplex(4096);
        let ctx = ctx();
        let server_task = tokio::spawn(async move {
            let (r, w) = tokio::io::split(server);
            handle_connection_for_test(r, w, ctx).await;
        });

        let (mut client_r, mut client_w) = tokio::io::split(client);
        write_typed(&mut client_w, &Request::Metrics).await.unwrap();
        let response: Response = read_typed(&mut client_r).await.unwrap();
        assert!(matches!(response, Response::Metrics { .. }));

        drop(client_w);
        let _ = server_task.await;
    }
}
