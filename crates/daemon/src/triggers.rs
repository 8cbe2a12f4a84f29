// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-trigger driver tasks (§4.6, §5): one file-watcher or email-poller
//! task per currently enabled FILE/EMAIL trigger. A supervisor loop
//! reconciles the live task set against `engine.triggers.all()` every few
//! seconds, so a trigger enabled or disabled through the control plane
//! picks up a driver (or loses one) without restarting the daemon.

use orc_core::{SystemClock, TriggerKind};
use orc_engine::Engine;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Quiet period a file trigger waits after the last filesystem event before
/// firing (§4.6).
const FILE_DEBOUNCE: Duration = Duration::from_secs(2);

/// How often an email trigger's mailbox is polled. Not named in
/// configuration, so it is fixed here rather than left to guess at a field
/// that doesn't exist.
const EMAIL_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// A single inbound message observed on a mailbox.
pub struct EmailMessage {
    pub message_id: String,
    pub payload: serde_json::Value,
}

/// Abstracts over however mailbox contents are actually fetched. No real
/// backend is wired up here — nothing in the surrounding stack speaks
/// IMAP/SMTP — so [`NullMailboxSource`] is the only implementation and
/// always reports an empty mailbox. A real deployment supplies its own.
pub trait MailboxSource: Send + Sync {
    fn poll(&self, mailbox: &str) -> Vec<EmailMessage>;
}

pub struct NullMailboxSource;

impl MailboxSource for NullMailboxSource {
    fn poll(&self, _mailbox: &str) -> Vec<EmailMessage> {
        Vec::new()
    }
}

/// Owns the live per-trigger driver tasks and reconciles them against the
/// engine's trigger registry on an interval.
pub struct TriggerSupervisor {
    engine: Arc<Engine<SystemClock>>,
    mailbox_source: Arc<dyn MailboxSource>,
    running: HashMap<orc_core::TriggerId, JoinHandle<()>>,
}

impl TriggerSupervisor {
    pub fn new(engine: Arc<Engine<SystemClock>>) -> Self {
        Self { engine, mailbox_source: Arc::new(NullMailboxSource), running: HashMap::new() }
    }

    pub async fn run(mut self, reconcile_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(reconcile_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.reconcile(&shutdown),
                _ = shutdown.changed() => break,
            }
        }
        for (trigger_id, handle) in self.running.drain() {
            handle.abort();
            debug!(%trigger_id, "stopped trigger driver on shutdown");
        }
    }

    fn reconcile(&mut self, shutdown: &watch::Receiver<bool>) {
        let active: HashSet<orc_core::TriggerId> = self
            .engine
            .triggers
            .all()
            .into_iter()
            .filter(|t| t.enabled && matches!(t.kind, TriggerKind::File | TriggerKind::Email))
            .map(|t| {
                let trigger_id = t.id;
                self.running
                    .entry(trigger_id)
                    .or_insert_with(|| spawn_driver(self.engine.clone(), self.mailbox_source.clone(), t, shutdown.clone()));
                trigger_id
            })
            .collect();

        self.running.retain(|trigger_id, handle| {
            if active.contains(trigger_id) {
                true
            } else {
                handle.abort();
                debug!(%trigger_id, "stopped trigger driver: disabled or removed");
                false
            }
        });
    }
}

fn spawn_driver(
    engine: Arc<Engine<SystemClock>>,
    mailbox_source: Arc<dyn MailboxSource>,
    trigger: orc_core::Trigger,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    match trigger.kind {
        TriggerKind::File => {
            let Some(path) = trigger.config.watch_path.clone() else {
                warn!(trigger_id = %trigger.id, "FILE trigger has no watch_path, skipping");
                return tokio::spawn(async {});
            };
            tokio::spawn(file_watch_task(engine, trigger.id, path, shutdown))
        }
        TriggerKind::Email => {
            let Some(mailbox) = trigger.config.mailbox.clone() else {
                warn!(trigger_id = %trigger.id, "EMAIL trigger has no mailbox, skipping");
                return tokio::spawn(async {});
            };
            tokio::spawn(email_poll_task(engine, mailbox_source, trigger.id, mailbox, shutdown))
        }
        _ => tokio::spawn(async {}),
    }
}

async fn file_watch_task(engine: Arc<Engine<SystemClock>>, trigger_id: orc_core::TriggerId, path: String, mut shutdown: watch::Receiver<bool>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let watch_path = PathBuf::from(&path);
    let watcher: RecommendedWatcher = match notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if res.is_ok() {
            let _ = tx.send(());
        }
    }) {
        Ok(mut watcher) => {
            if let Err(e) = watcher.watch(&watch_path, RecursiveMode::NonRecursive) {
                warn!(%trigger_id, path = %path, error = %e, "failed to watch path");
                return;
            }
            watcher
        }
        Err(e) => {
            warn!(%trigger_id, error = %e, "failed to create file watcher");
            return;
        }
    };

    loop {
        tokio::select! {
            event = rx.recv() => {
                if event.is_none() {
                    break;
                }
                drain_quiet_period(&mut rx).await;
                fire(&engine, trigger_id, serde_json::json!({ "path": path }));
            }
            _ = shutdown.changed() => break,
        }
    }
    drop(watcher);
}

/// Collapse a burst of filesystem events into one fire: keep resetting the
/// quiet-period timer as long as more events keep arriving.
async fn drain_quiet_period(rx: &mut mpsc::UnboundedReceiver<()>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(FILE_DEBOUNCE) => return,
            more = rx.recv() => {
                if more.is_none() {
                    return;
                }
            }
        }
    }
}

async fn email_poll_task(
    engine: Arc<Engine<SystemClock>>,
    source: Arc<dyn MailboxSource>,
    trigger_id: orc_core::TriggerId,
    mailbox: String,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut seen = HashSet::new();
    let mut ticker = tokio::time::interval(EMAIL_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return,
        }
        for message in source.poll(&mailbox) {
            if !seen.insert(message.message_id.clone()) {
                continue;
            }
            fire(&engine, trigger_id, message.payload);
        }
    }
}

fn fire(engine: &Engine<SystemClock>, trigger_id: orc_core::TriggerId, payload: serde_json::Value) {
    match engine.fire_trigger_manually(trigger_id, payload) {
        Ok(Some(job_id)) => info!(%trigger_id, %job_id, "trigger fired"),
        Ok(None) => debug!(%trigger_id, "trigger stimulus dropped: disabled"),
        Err(e) => warn!(%trigger_id, error = %e, "trigger fire failed"),
    }
}
