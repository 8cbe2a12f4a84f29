// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The trigger registry (§4.6): translates external stimuli (manual,
//! webhook, file, email, form, chat, workflow-call) into job enqueues.
//! SCHEDULED triggers delegate entirely to the [`crate::scheduler::Scheduler`]
//! and never fire through [`TriggerManager::fire`].

use crate::queue::Queue;
use crate::EngineError;
use orc_core::{Clock, JobId, JobSpec, Trigger, TriggerConfig, TriggerId, TriggerKind};
use orc_storage::Repository;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub struct TriggerManager<C: Clock> {
    triggers: RwLock<HashMap<TriggerId, Trigger>>,
    repo: Arc<dyn Repository>,
    clock: C,
}

impl<C: Clock> TriggerManager<C> {
    pub fn new(repo: Arc<dyn Repository>, clock: C) -> Self {
        let triggers: HashMap<TriggerId, Trigger> = repo.all_triggers().into_iter().map(|t| (t.id, t)).collect();
        Self { triggers: RwLock::new(triggers), repo, clock }
    }

    pub fn register(&self, kind: TriggerKind, config: TriggerConfig, workflow_id: impl Into<String>) -> TriggerId {
        let trigger = Trigger::new(TriggerId::new(), kind, config, workflow_id, self.clock.utc_now());
        let id = trigger.id;
        self.triggers.write().insert(id, trigger.clone());
        self.repo.put_trigger(trigger);
        id
    }

    pub fn unregister(&self, id: TriggerId) -> Result<Trigger, EngineError> {
        let trigger = self.triggers.write().remove(&id).ok_or(EngineError::TriggerNotFound(id))?;
        self.repo.remove_trigger(id);
        Ok(trigger)
    }

    pub fn set_enabled(&self, id: TriggerId, enabled: bool) -> Result<Trigger, EngineError> {
        let mut triggers = self.triggers.write();
        let trigger = triggers.get_mut(&id).ok_or(EngineError::TriggerNotFound(id))?;
        if enabled {
            trigger.enable();
        } else {
            trigger.disable();
        }
        let snapshot = trigger.clone();
        drop(triggers);
        self.repo.put_trigger(snapshot.clone());
        Ok(snapshot)
    }

    pub fn get(&self, id: TriggerId) -> Option<Trigger> {
        self.triggers.read().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<Trigger> {
        self.triggers.read().values().cloned().collect()
    }

    /// Translate one stimulus into a job enqueue. Returns `Ok(None)` for a
    /// disabled trigger — the stimulus is silently dropped and no
    /// statistics move (§4.6).
    pub fn fire(&self, id: TriggerId, parameters: serde_json::Value, queue: &Queue<C>) -> Result<Option<JobId>, EngineError> {
        let now = self.clock.utc_now();
        let mut triggers = self.triggers.write();
        let trigger = triggers.get_mut(&id).ok_or(EngineError::TriggerNotFound(id))?;
        if !trigger.accepts_stimulus() {
            return Ok(None);
        }
        trigger.record_fire(now);
        let snapshot = trigger.clone();
        drop(triggers);
        self.repo.put_trigger(snapshot.clone());

        let spec = JobSpec::builder(snapshot.workflow_id).parameters(parameters).build();
        let job_id = queue.submit(spec, None, false, None)?;
        Ok(Some(job_id))
    }
}

#[cfg(test)]
#[path = "trigger_manager_tests.rs"]
mod tests;
