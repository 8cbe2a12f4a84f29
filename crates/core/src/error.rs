// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core-level validation errors shared by callers that submit jobs, robots,
//! schedules, and triggers. Component-level composition (conflict,
//! not-found, capacity, transport, internal) lives in the crates that own
//! those concerns — queue, fleet, storage — and wraps these via `#[from]`.

/// A submitted workflow document or job spec failed validation before any
/// state change occurred.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("workflow_id must not be empty")]
    EmptyWorkflowId,

    #[error("timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error(transparent)]
    Priority(#[from] crate::priority::InvalidPriority),

    #[error(transparent)]
    Schedule(#[from] crate::schedule::InvalidSchedule),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_error_wraps_with_from() {
        let parse_err = "urgent".parse::<crate::priority::Priority>().unwrap_err();
        let err: ValidationError = parse_err.into();
        assert!(matches!(err, ValidationError::Priority(_)));
    }
}
