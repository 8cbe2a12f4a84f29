// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("io error persisting snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot at {path} has version {found}, expected {expected}")]
    VersionMismatch { path: String, found: u32, expected: u32 },
}
