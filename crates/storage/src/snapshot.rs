// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk snapshot format and atomic write path for [`InMemoryRepository`](crate::InMemoryRepository).

use crate::RepositoryError;
use chrono::{DateTime, Utc};
use orc_core::{Job, JobResult, Robot, Schedule, Trigger};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

/// The complete repository state at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub jobs: Vec<Job>,
    pub robots: Vec<Robot>,
    pub schedules: Vec<Schedule>,
    pub triggers: Vec<Trigger>,
    pub results: Vec<JobResult>,
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`. The
/// oldest backup is removed when the limit is reached.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| if n == 1 { path.with_extension("bak") } else { path.with_extension(format!("bak.{n}")) };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

/// Write `snapshot` to `path` atomically: serialize to a sibling `.tmp`
/// file, fsync it, rotate the previous file into a `.bak` slot, then
/// rename the temp file into place. A crash at any point before the final
/// rename leaves the previous snapshot (or its `.bak`) intact.
pub(crate) fn write_snapshot_atomically(path: &Path, snapshot: &RepositorySnapshot) -> Result<(), RepositoryError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    fs::write(&tmp_path, &bytes)?;

    if path.exists() {
        let bak_path = rotate_bak_path(path);
        fs::rename(path, bak_path)?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
