// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level error taxonomy (§7): validation, conflict, not-found, and
//! capacity are surfaced to callers; transport and internal errors are
//! handled internally and logged.

use orc_core::{JobId, RobotId, ScheduleId, TriggerId};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] orc_core::ValidationError),

    #[error("job {0} already exists")]
    DuplicateJob(JobId),

    #[error("robot {0} already registered")]
    DuplicateRobot(RobotId),

    #[error("invalid state transition: {0}")]
    InvalidTransition(#[from] orc_core::StateTransitionError),

    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("robot {0} not found")]
    RobotNotFound(RobotId),

    #[error("schedule {0} not found")]
    ScheduleNotFound(ScheduleId),

    #[error("trigger {0} not found")]
    TriggerNotFound(TriggerId),

    #[error("job {0} is already terminal")]
    AlreadyTerminal(JobId),

    #[error("job {0} is not terminal")]
    NotTerminal(JobId),

    #[error("queue is at capacity ({0} jobs)")]
    QueueFull(usize),

    #[error("no eligible robot for job {0}")]
    NoEligibleRobot(JobId),

    #[error("internal repository error: {0}")]
    Repository(#[from] orc_storage::RepositoryError),
}

impl EngineError {
    /// Maps to [`orc_wire::ResponseErrorKind`] for the control-plane response.
    pub fn response_kind(&self) -> orc_wire::ResponseErrorKind {
        use orc_wire::ResponseErrorKind as K;
        match self {
            EngineError::Validation(_) => K::InvalidWorkflow,
            EngineError::DuplicateJob(_) => K::DuplicateJob,
            EngineError::DuplicateRobot(_) => K::Conflict,
            EngineError::InvalidTransition(_) => K::Conflict,
            EngineError::JobNotFound(_)
            | EngineError::RobotNotFound(_)
            | EngineError::ScheduleNotFound(_)
            | EngineError::TriggerNotFound(_) => K::NotFound,
            EngineError::AlreadyTerminal(_) => K::AlreadyTerminal,
            EngineError::NotTerminal(_) => K::NotTerminal,
            EngineError::QueueFull(_) => K::QueueFull,
            EngineError::NoEligibleRobot(_) => K::QueueFull,
            EngineError::Repository(_) => K::Conflict,
        }
    }
}
