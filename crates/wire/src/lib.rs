// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire formats for the orchestrator: the framed robot protocol (§6.2) and
//! the control-plane request/response DTOs (§6.1).
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload, shared by
//! both channels.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod control;
mod framing;
mod robot_message;
mod snapshot;

pub use control::{ErrorKind as ResponseErrorKind, Request, Response};
pub use framing::{decode, encode, read_message, read_typed, write_message, write_typed, ProtocolError};
pub use robot_message::{Frame, RobotMessage};
pub use snapshot::{JobSnapshot, RobotSnapshot, ScheduleSnapshot, StatisticsResponse, TriggerSnapshot};
