// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine (§5): composes the queue, fleet, dispatcher, scheduler,
//! trigger manager, and result collector into the single object the daemon
//! drives, and maps the control-plane `Request`/`Response` pair onto it.

use crate::dispatch::{Assignment, Dispatcher};
use crate::fleet::Fleet;
use crate::queue::{CancelOutcome, Queue};
use crate::result_collector::ResultCollector;
use crate::scheduler::{Fired, Scheduler};
use crate::trigger_manager::TriggerManager;
use crate::EngineError;
use orc_core::{
    Clock, Job, JobId, JobResult, JobSpec, JobStatus, OrchestratorConfig, Robot, RobotId, RobotStatus, Schedule,
    ScheduleId, Trigger, TriggerId,
};
use orc_storage::Repository;
use orc_wire::{Request, Response, StatisticsResponse};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// The orchestrator's in-process state, parameterised over the clock so
/// tests can drive it deterministically through [`orc_core::FakeClock`].
pub struct Engine<C: Clock> {
    pub queue: Arc<Queue<C>>,
    pub fleet: Arc<Fleet<C>>,
    pub dispatcher: Dispatcher<C>,
    pub scheduler: Scheduler<C>,
    pub triggers: TriggerManager<C>,
    pub results: ResultCollector<C>,
    repo: Arc<dyn Repository>,
    /// Log lines accumulated for a RUNNING job, drained into its
    /// [`JobResult`] once it reaches a terminal status.
    pending_logs: Mutex<HashMap<JobId, Vec<String>>>,
}

impl<C: Clock> Engine<C> {
    pub fn new(repo: Arc<dyn Repository>, clock: C, config: &OrchestratorConfig) -> Self {
        let queue = Arc::new(Queue::new(repo.clone(), clock.clone(), config.dedup_window(), config.max_queue_depth));
        let fleet = Arc::new(Fleet::new(repo.clone(), clock.clone(), config.stale_robot_timeout()));
        let dispatcher = Dispatcher::new(queue.clone(), fleet.clone(), config.load_balancing_strategy);
        let scheduler = Scheduler::new(repo.clone(), clock.clone());
        let triggers = TriggerManager::new(repo.clone(), clock.clone());
        let results = ResultCollector::new(repo.clone(), clock);
        Self { queue, fleet, dispatcher, scheduler, triggers, results, repo, pending_logs: Mutex::new(HashMap::new()) }
    }

    // -- jobs --------------------------------------------------------

    pub fn submit_job(&self, spec: JobSpec, dedup_key: Option<String>, check_duplicate: bool) -> Result<JobId, EngineError> {
        self.queue.submit(spec, dedup_key, check_duplicate, None)
    }

    pub fn cancel_job(&self, job_id: JobId, reason: String) -> Result<CancelOutcome, EngineError> {
        self.queue.cancel(job_id, reason)
    }

    /// `RetryJob` (§6.1): resubmit the original payload under a fresh id,
    /// carrying `retry_count` forward. Rejects jobs that aren't terminal yet.
    pub fn retry_job(&self, job_id: JobId) -> Result<JobId, EngineError> {
        let original = self.queue.get(job_id).ok_or(EngineError::JobNotFound(job_id))?;
        if !original.is_terminal() {
            return Err(EngineError::NotTerminal(job_id));
        }

        let mut builder = JobSpec::builder(original.workflow_id.clone())
            .workflow_name(original.workflow_name.clone())
            .workflow_document(original.workflow_document.clone())
            .parameters(original.parameters.clone())
            .priority(original.priority)
            .timeout_secs(original.timeout_secs)
            .required_tags(original.required_tags.clone())
            .required_capabilities(original.required_capabilities.clone());
        if let Some(target) = original.target_robot_id {
            builder = builder.target_robot_id(target);
        }
        self.queue.submit_retry(builder.build(), original.retry_count + 1)
    }

    pub fn get_job(&self, job_id: JobId) -> Option<Job> {
        self.queue.get(job_id)
    }

    /// Filter + paginate over the full job set. Filters compose with AND;
    /// `page`/`page_size` slice after filtering and sorting by `created_at`.
    pub fn list_jobs(
        &self,
        status: Option<JobStatus>,
        robot_id: Option<RobotId>,
        workflow_id: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> (Vec<Job>, u64) {
        let mut jobs = self.all_jobs();
        if let Some(status) = status {
            jobs.retain(|j| j.status == status);
        }
        if let Some(robot_id) = robot_id {
            jobs.retain(|j| j.assigned_robot_id == Some(robot_id));
        }
        if let Some(workflow_id) = workflow_id {
            jobs.retain(|j| j.workflow_id == workflow_id);
        }
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = jobs.len() as u64;
        let start = (page as usize).saturating_mul(page_size.max(1) as usize);
        let page = jobs.into_iter().skip(start).take(page_size.max(1) as usize).collect();
        (page, total)
    }

    fn all_jobs(&self) -> Vec<Job> {
        self.repo.all_jobs()
    }

    /// Record a log line reported on a RUNNING job; buffered until the job
    /// reaches a terminal status and is handed to the result collector.
    pub fn append_job_log(&self, job_id: JobId, line: String) {
        self.pending_logs.lock().entry(job_id).or_default().push(line);
    }

    pub fn append_job_logs(&self, job_id: JobId, lines: Vec<String>) {
        self.pending_logs.lock().entry(job_id).or_default().extend(lines);
    }

    fn take_logs(&self, job_id: JobId) -> Vec<String> {
        self.pending_logs.lock().remove(&job_id).unwrap_or_default()
    }

    /// `JobComplete`: transition the job, release the robot slot, and
    /// record a terminal result. `None` if the report is stale (§4.4).
    pub fn complete_job(&self, job_id: JobId, robot_id: RobotId, result: serde_json::Value) -> Option<JobResult> {
        let job = self.queue.complete(job_id, robot_id, result)?;
        self.fleet.record_release(robot_id, Some(&job.workflow_id));
        let logs = self.take_logs(job_id);
        self.results.record(&job, logs)
    }

    /// `JobFailed`: transition the job, release the robot slot (without
    /// recording an affinity success), and record a terminal result.
    pub fn fail_job(&self, job_id: JobId, robot_id: RobotId, error: orc_core::JobError) -> Option<JobResult> {
        let job = self.queue.fail(job_id, robot_id, error)?;
        self.fleet.record_release(robot_id, None);
        let logs = self.take_logs(job_id);
        self.results.record(&job, logs)
    }

    /// `JobReject`: the robot declined the assignment; requeue it and free
    /// the robot's slot without touching affinity.
    pub fn reject_job(&self, job_id: JobId, robot_id: RobotId) -> Option<Job> {
        let job = self.queue.requeue_from_running(job_id)?;
        self.fleet.record_release(robot_id, None);
        Some(job)
    }

    /// `JobCancelled` ack from the robot, or grace-period expiry forcing
    /// the same transition (§4.4).
    pub fn finish_cancel(&self, job_id: JobId, robot_id: RobotId, reason: String) -> Option<JobResult> {
        let job = self.queue.force_cancel_running(job_id, reason)?;
        self.fleet.record_release(robot_id, None);
        let logs = self.take_logs(job_id);
        self.results.record(&job, logs)
    }

    pub fn update_progress(&self, job_id: JobId, pct: u8, current_node: Option<String>) -> bool {
        self.queue.update_progress(job_id, pct, current_node)
    }

    /// Mark expired leases TIMEOUT, release the robots that held them, and
    /// record a result for each (§4.1 timeout path).
    pub fn sweep_timeouts(&self) -> Vec<JobResult> {
        self.queue
            .sweep_timeouts()
            .into_iter()
            .filter_map(|job| {
                if let Some(robot_id) = job.assigned_robot_id {
                    self.fleet.record_release(robot_id, None);
                }
                let logs = self.take_logs(job.id);
                self.results.record(&job, logs)
            })
            .collect()
    }

    // -- robots --------------------------------------------------------

    pub fn register_robot(
        &self,
        id: RobotId,
        name: impl Into<String>,
        tags: std::collections::BTreeSet<String>,
        capabilities: std::collections::BTreeSet<String>,
        max_concurrent_jobs: u32,
    ) -> Result<RobotId, EngineError> {
        self.fleet.register(id, name, tags, capabilities, max_concurrent_jobs)
    }

    pub fn unregister_robot(&self, robot_id: RobotId) -> Result<Robot, EngineError> {
        self.fleet.unregister(robot_id)
    }

    pub fn get_robot(&self, robot_id: RobotId) -> Option<Robot> {
        self.fleet.get(robot_id)
    }

    pub fn list_robots(&self, status: Option<RobotStatus>) -> Vec<Robot> {
        let mut robots = self.fleet.all();
        if let Some(status) = status {
            robots.retain(|r| r.status == status);
        }
        robots.sort_by(|a, b| a.id.cmp(&b.id));
        robots
    }

    pub fn heartbeat(&self, robot_id: RobotId, current_jobs: u32) -> Result<(), EngineError> {
        self.fleet.heartbeat(robot_id, current_jobs)
    }

    /// Mark stale robots OFFLINE and requeue whatever they still held
    /// (§4.2 robot-loss recovery).
    pub fn sweep_stale(&self) -> Vec<RobotId> {
        let gone_offline = self.fleet.sweep_stale();
        for robot_id in &gone_offline {
            for job_id in self.queue.running_for_robot(*robot_id) {
                self.queue.requeue_from_running(job_id);
            }
        }
        gone_offline
    }

    // -- dispatch / schedules / triggers --------------------------------------------------------

    pub fn dispatch_tick(&self) -> Vec<Assignment> {
        self.dispatcher.tick()
    }

    pub fn scheduler_tick(&self) -> Vec<Fired> {
        self.scheduler.tick(&self.queue)
    }

    pub fn create_schedule(
        &self,
        workflow_id: impl Into<String>,
        frequency: orc_core::Frequency,
        priority: orc_core::Priority,
        target_robot_id: Option<RobotId>,
    ) -> Result<ScheduleId, EngineError> {
        self.scheduler.create(workflow_id, frequency, priority, target_robot_id)
    }

    pub fn delete_schedule(&self, id: ScheduleId) -> Result<Schedule, EngineError> {
        self.scheduler.delete(id)
    }

    pub fn toggle_schedule(&self, id: ScheduleId, enabled: bool) -> Result<Schedule, EngineError> {
        self.scheduler.toggle(id, enabled)
    }

    pub fn register_trigger(
        &self,
        kind: orc_core::TriggerKind,
        config: orc_core::TriggerConfig,
        workflow_id: impl Into<String>,
    ) -> TriggerId {
        self.triggers.register(kind, config, workflow_id)
    }

    pub fn unregister_trigger(&self, id: TriggerId) -> Result<Trigger, EngineError> {
        self.triggers.unregister(id)
    }

    pub fn fire_trigger_manually(&self, id: TriggerId, payload: serde_json::Value) -> Result<Option<JobId>, EngineError> {
        self.triggers.fire(id, payload, &self.queue)
    }

    // -- metrics --------------------------------------------------------

    pub fn metrics(&self) -> StatisticsResponse {
        let mut robots_by_status: HashMap<RobotStatus, u64> = HashMap::new();
        for robot in self.fleet.all() {
            *robots_by_status.entry(robot.status).or_insert(0) += 1;
        }
        StatisticsResponse {
            queue_depth_by_status: self.queue.status_counts(),
            robots_by_status: robots_by_status.into_iter().collect(),
            workflow_stats: self.results.all_workflow_stats().into_iter().collect(),
            robot_stats: self.results.all_robot_stats().into_iter().collect(),
        }
    }

    // -- control plane --------------------------------------------------------

    /// Handle one `Request` and produce its `Response`, mapping every
    /// `EngineError` through [`EngineError::response_kind`] (§7).
    pub fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::SubmitJob {
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
            } => {
                // Dedup identity is the workflow + its parameters (§8): two
                // SubmitJob calls with the same pair within the dedup window
                // collapse to one job.
                let dedup_key = check_duplicate.then(|| parameters.to_string());
                let mut builder = JobSpec::builder(workflow_id)
                    .workflow_document(workflow_document)
                    .parameters(parameters)
                    .priority(priority)
                    .required_tags(required_tags)
                    .required_capabilities(required_capabilities);
                if let Some(target_robot_id) = target_robot_id {
                    builder = builder.target_robot_id(target_robot_id);
                }
                if let Some(scheduled_time) = scheduled_time {
                    builder = builder.scheduled_time(scheduled_time);
                }
                if let Some(timeout_secs) = timeout_secs {
                    builder = builder.timeout_secs(timeout_secs);
                }
                match self.submit_job(builder.build(), dedup_key, check_duplicate) {
                    Ok(job_id) => {
                        let status = self.get_job(job_id).map(|j| j.status).unwrap_or(JobStatus::Pending);
                        Response::JobSubmitted { job_id, status }
                    }
                    Err(e) => error_response(&e),
                }
            }

            Request::CancelJob { job_id, reason } => match self.cancel_job(job_id, reason) {
                Ok(_) => Response::Ok,
                Err(e) => error_response(&e),
            },

            Request::RetryJob { job_id } => match self.retry_job(job_id) {
                Ok(new_job_id) => {
                    let status = self.get_job(new_job_id).map(|j| j.status).unwrap_or(JobStatus::Pending);
                    Response::JobSubmitted { job_id: new_job_id, status }
                }
                Err(e) => error_response(&e),
            },

            Request::GetJob { job_id } => {
                Response::Job { job: self.get_job(job_id).map(|j| Box::new((&j).into())) }
            }

            Request::ListJobs { status, robot_id, workflow_id, page, page_size } => {
                let (jobs, total) = self.list_jobs(status, robot_id, workflow_id.as_deref(), page, page_size);
                Response::Jobs { jobs: jobs.iter().map(Into::into).collect(), total }
            }

            Request::RegisterRobot { robot_id, name, env: _, tags, caps, max } => {
                match self.register_robot(robot_id, name, tags, caps, max) {
                    Ok(_) => Response::Robot { robot: Box::new((&self.get_robot(robot_id).expect("just registered")).into()) },
                    Err(e) => error_response(&e),
                }
            }

            Request::UnregisterRobot { robot_id } => match self.unregister_robot(robot_id) {
                Ok(_) => Response::Ok,
                Err(e) => error_response(&e),
            },

            Request::ListRobots { status } => {
                Response::Robots { robots: self.list_robots(status).iter().map(Into::into).collect() }
            }

            Request::CreateSchedule { workflow_id, frequency, target_robot_id, priority } => {
                match self.create_schedule(workflow_id, frequency, priority, target_robot_id) {
                    Ok(id) => Response::Schedule {
                        schedule: Box::new((&self.scheduler.get(id).expect("just created")).into()),
                    },
                    Err(e) => error_response(&e),
                }
            }

            Request::DeleteSchedule { schedule_id } => match self.delete_schedule(schedule_id) {
                Ok(_) => Response::Ok,
                Err(e) => error_response(&e),
            },

            Request::ToggleSchedule { schedule_id, enabled } => match self.toggle_schedule(schedule_id, enabled) {
                Ok(schedule) => Response::Schedule { schedule: Box::new((&schedule).into()) },
                Err(e) => error_response(&e),
            },

            Request::RegisterTrigger { kind, config, workflow_id } => {
                let id = self.register_trigger(kind, config, workflow_id);
                Response::Trigger { trigger: Box::new((&self.triggers.get(id).expect("just registered")).into()) }
            }

            Request::UnregisterTrigger { trigger_id } => match self.unregister_trigger(trigger_id) {
                Ok(_) => Response::Ok,
                Err(e) => error_response(&e),
            },

            Request::EnableTrigger { trigger_id } => match self.triggers.set_enabled(trigger_id, true) {
                Ok(trigger) => Response::Trigger { trigger: Box::new((&trigger).into()) },
                Err(e) => error_response(&e),
            },

            Request::DisableTrigger { trigger_id } => match self.triggers.set_enabled(trigger_id, false) {
                Ok(trigger) => Response::Trigger { trigger: Box::new((&trigger).into()) },
                Err(e) => error_response(&e),
            },

            Request::FireTriggerManually { trigger_id, payload } => match self.fire_trigger_manually(trigger_id, payload) {
                Ok(Some(job_id)) => {
                    let status = self.get_job(job_id).map(|j| j.status).unwrap_or(JobStatus::Pending);
                    Response::JobSubmitted { job_id, status }
                }
                Ok(None) => Response::Ok,
                Err(e) => error_response(&e),
            },

            Request::Metrics => Response::Metrics { stats: Box::new(self.metrics()) },
        }
    }
}

fn error_response(err: &EngineError) -> Response {
    tracing::warn!(error = %err, "control request failed");
    Response::Error { kind: err.response_kind(), message: err.to_string() }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
