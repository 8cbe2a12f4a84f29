// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The robot wire listener (§6.2, §4.4): one TCP accept loop, one
//! read+write task pair per connected robot, translating framed
//! [`RobotMessage`]s into [`Engine`] calls and engine-driven pushes
//! (`JobAssign`, `JobCancel`) back out onto the wire.

use crate::error::LifecycleError;
use orc_core::{RobotId, SystemClock};
use orc_engine::Engine;
use orc_wire::{read_typed, write_typed, Frame, RobotMessage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Bound on a robot's outbound queue (§5): beyond this, the connection is
/// considered unable to keep up and its in-flight work is treated as lost.
const OUTBOUND_QUEUE_DEPTH: usize = 256;

/// How long a push to a robot's outbound queue may block before the robot
/// is treated as unreachable (§5).
const ENQUEUE_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-robot outbound channels, shared between the per-connection write
/// tasks and the background dispatch/cancel drivers.
#[derive(Default)]
pub struct RobotChannels {
    senders: Mutex<HashMap<RobotId, mpsc::Sender<Frame>>>,
}

impl RobotChannels {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, robot_id: RobotId, sender: mpsc::Sender<Frame>) {
        self.senders.lock().insert(robot_id, sender);
    }

    fn remove(&self, robot_id: RobotId) {
        self.senders.lock().remove(&robot_id);
    }

    /// Push a message to a connected robot. Returns `false` if the robot
    /// has no open connection, or the connection's queue is full past
    /// [`ENQUEUE_TIMEOUT`] — both treated by callers as robot loss.
    pub async fn push(&self, robot_id: RobotId, message: RobotMessage) -> bool {
        let sender = self.senders.lock().get(&robot_id).cloned();
        let Some(sender) = sender else { return false };
        tokio::time::timeout(ENQUEUE_TIMEOUT, sender.send(Frame::new(message))).await.is_ok()
    }
}

/// Bind the robot wire listener and accept connections until shutdown.
pub async fn run(
    bind_addr: (String, u16),
    engine: Arc<Engine<SystemClock>>,
    channels: Arc<RobotChannels>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> Result<(), LifecycleError> {
    let listener = TcpListener::bind((bind_addr.0.as_str(), bind_addr.1))
        .await
        .map_err(|e| LifecycleError::BindRobot(bind_addr.1, e))?;
    info!(addr = ?bind_addr, "robot listener bound");
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        info!(%addr, "robot connection accepted");
                        let engine = engine.clone();
                        let channels = channels.clone();
                        tokio::spawn(async move {
                            handle_robot(stream, engine, channels).await;
                        });
                    }
                    Err(e) => warn!(error = %e, "robot accept failed"),
                }
            }
            _ = shutdown.changed() => {
                info!("robot listener stopping");
                return Ok(());
            }
        }
    }
}

async fn handle_robot(stream: TcpStream, engine: Arc<Engine<SystemClock>>, channels: Arc<RobotChannels>) {
    let (mut reader, writer) = stream.into_split();

    let first: Frame = match read_typed(&mut reader).await {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "robot connection closed before registering");
            return;
        }
    };
    let RobotMessage::Register { robot_id, name, env: _, tags, caps, max } = first.message else {
        warn!("robot connection's first frame was not Register; dropping");
        return;
    };

    if let Err(e) = engine.register_robot(robot_id, name, tags, caps, max) {
        warn!(%robot_id, error = %e, "robot registration rejected");
        return;
    }

    let (tx, rx) = mpsc::channel::<Frame>(OUTBOUND_QUEUE_DEPTH);
    channels.insert(robot_id, tx.clone());
    let writer_task = tokio::spawn(run_writer(writer, rx));

    let ack = Frame::reply_to(first.id, RobotMessage::RegisterAck { robot_id, heartbeat_interval_seconds: 10 });
    if tx.send(ack).await.is_err() {
        channels.remove(robot_id);
        return;
    }

    read_loop(reader, &engine, &channels, &tx, robot_id).await;

    channels.remove(robot_id);
    drop(tx);
    let _ = writer_task.await;
    info!(%robot_id, "robot disconnected");
}

async fn run_writer<W: AsyncWrite + Unpin>(mut writer: W, mut rx: mpsc::Receiver<Frame>) {
    while let Some(frame) = rx.recv().await {
        if write_typed(&mut writer, &frame).await.is_err() {
            return;
        }
    }
}

async fn read_loop<R: AsyncRead + Unpin>(
    mut reader: R,
    engine: &Engine<SystemClock>,
    channels: &RobotChannels,
    tx: &mpsc::Sender<Frame>,
    robot_id: RobotId,
) {
    loop {
        let frame: Frame = match read_typed(&mut reader).await {
            Ok(frame) => frame,
            Err(orc_wire::ProtocolError::ConnectionClosed) => return,
            Err(e) => {
                warn!(%robot_id, error = %e, "robot connection protocol error");
                return;
            }
        };

        match frame.message {
            RobotMessage::Heartbeat { robot_id: reported, current_jobs } => {
                if reported != robot_id {
                    warn!(%robot_id, %reported, "heartbeat robot_id mismatch, ignoring");
                    continue;
                }
                if engine.heartbeat(robot_id, current_jobs).is_ok() {
                    let ack = Frame::reply_to(frame.id, RobotMessage::HeartbeatAck);
                    if tx.send(ack).await.is_err() {
                        return;
                    }
                }
            }
            RobotMessage::JobAccept { job_id: _ } => {
                // No state change: the job already moved to RUNNING when dispatched.
            }
            RobotMessage::JobReject { job_id, reason } => {
                warn!(%robot_id, %job_id, %reason, "robot rejected job assignment");
                engine.reject_job(job_id, robot_id);
            }
            RobotMessage::JobProgress { job_id, pct, node } => {
                engine.update_progress(job_id, pct, node);
            }
            RobotMessage::JobComplete { job_id, result } => {
                engine.complete_job(job_id, robot_id, result.unwrap_or(serde_json::Value::Null));
            }
            RobotMessage::JobFailed { job_id, kind, message, node, stack_trace } => {
                let mut error = orc_core::JobError::new(kind, message);
                if let Some(node) = node {
                    error = error.with_node(node);
                }
                if let Some(trace) = stack_trace {
                    error = error.with_stack_trace(trace);
                }
                engine.fail_job(job_id, robot_id, error);
            }
            RobotMessage::JobCancelled { job_id } => {
                engine.finish_cancel(job_id, robot_id, "robot acknowledged cancel".into());
            }
            RobotMessage::LogEntry { job_id, line } => {
                engine.append_job_log(job_id, line);
            }
            RobotMessage::LogBatch { job_id, entries } => {
                engine.append_job_logs(job_id, entries);
            }
            RobotMessage::StatusRequest => {
                let (status, current_jobs) = match engine.get_robot(robot_id) {
                    Some(r) => (r.status.to_string(), r.current_jobs),
                    None => ("unknown".to_string(), 0),
                };
                let reply = Frame::reply_to(frame.id, RobotMessage::StatusResponse { current_jobs, status });
                if tx.send(reply).await.is_err() {
                    return;
                }
            }
            RobotMessage::Disconnect { .. } => return,
            RobotMessage::Pause | RobotMessage::Resume | RobotMessage::Shutdown => {
                // Operator-initiated signals the robot itself originates are not
                // expected inbound; log and ignore rather than drop the connection.
                warn!(%robot_id, kind = frame.message.type_name(), "unexpected inbound control frame from robot");
            }
            RobotMessage::Register { .. } | RobotMessage::RegisterAck { .. } | RobotMessage::HeartbeatAck
            | RobotMessage::JobAssign { .. } | RobotMessage::JobCancel { .. } | RobotMessage::StatusResponse { .. } => {
                warn!(%robot_id, kind = frame.message.type_name(), "robot sent a server-originated message type");
            }
        }
    }
}

/// Translate a dispatched [`orc_engine::Assignment`] into a `JobAssign`
/// push. Returns `false` if delivery failed — the caller requeues the job.
pub async fn push_assignment(channels: &RobotChannels, assignment: &orc_engine::Assignment) -> bool {
    channels
        .push(
            assignment.robot_id,
            RobotMessage::JobAssign {
                job_id: assignment.job.id,
                workflow_id: assignment.job.workflow_id.clone(),
                workflow_document: assignment.job.workflow_document.clone(),
                parameters: assignment.job.parameters.clone(),
                timeout_secs: assignment.job.timeout_secs,
            },
        )
        .await
}

/// Tell a robot to stop a running job. Best-effort: the engine has already
/// moved the job through its own cancel/timeout transition regardless of
/// whether the robot is reachable to receive this.
pub async fn push_cancel(channels: &RobotChannels, robot_id: RobotId, job_id: orc_core::JobId, reason: String) -> bool {
    channels.push(robot_id, RobotMessage::JobCancel { job_id, reason }).await
}
