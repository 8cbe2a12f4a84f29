// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_core::{Job, JobStatus, Robot};

#[test]
fn put_and_get_job_round_trips() {
    let repo = InMemoryRepository::new();
    let job = Job::builder().status(JobStatus::Queued).build();
    repo.put_job(job.clone());
    assert_eq!(repo.get_job(job.id).unwrap().status, JobStatus::Queued);
}

#[test]
fn jobs_by_status_filters_correctly() {
    let repo = InMemoryRepository::new();
    repo.put_job(Job::builder().status(JobStatus::Queued).build());
    repo.put_job(Job::builder().status(JobStatus::Running).build());
    repo.put_job(Job::builder().status(JobStatus::Queued).build());

    assert_eq!(repo.jobs_by_status(JobStatus::Queued).len(), 2);
    assert_eq!(repo.jobs_by_status(JobStatus::Running).len(), 1);
    assert_eq!(repo.jobs_by_status(JobStatus::Completed).len(), 0);
}

#[test]
fn remove_job_deletes_and_returns_it() {
    let repo = InMemoryRepository::new();
    let job = Job::builder().build();
    repo.put_job(job.clone());
    let removed = repo.remove_job(job.id).unwrap();
    assert_eq!(removed.id, job.id);
    assert!(repo.get_job(job.id).is_none());
}

#[test]
fn robots_round_trip() {
    let repo = InMemoryRepository::new();
    let robot = Robot::builder().build();
    repo.put_robot(robot.clone());
    assert_eq!(repo.all_robots().len(), 1);
    repo.remove_robot(robot.id);
    assert!(repo.all_robots().is_empty());
}

#[test]
fn persist_without_snapshot_path_is_a_noop() {
    let repo = InMemoryRepository::new();
    repo.put_job(Job::builder().build());
    assert!(repo.persist().is_ok());
}

#[test]
fn persist_then_load_reconstructs_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snap.json");

    let repo = InMemoryRepository::with_snapshot_path(&path);
    let job = Job::builder().status(JobStatus::Queued).build();
    let robot = Robot::builder().build();
    repo.put_job(job.clone());
    repo.put_robot(robot.clone());
    repo.persist().unwrap();

    let reloaded = InMemoryRepository::load(&path).unwrap();
    assert_eq!(reloaded.get_job(job.id).unwrap().status, JobStatus::Queued);
    assert_eq!(reloaded.all_robots().len(), 1);
}

#[test]
fn load_with_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.json");
    let repo = InMemoryRepository::load(&path).unwrap();
    assert!(repo.all_jobs().is_empty());
}

#[test]
fn load_rejects_mismatched_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snap.json");
    let bogus = serde_json::json!({
        "v": 999,
        "created_at": Utc::now(),
        "jobs": [], "robots": [], "schedules": [], "triggers": [], "results": [],
    });
    std::fs::write(&path, serde_json::to_vec(&bogus).unwrap()).unwrap();

    let err = InMemoryRepository::load(&path).unwrap_err();
    assert!(matches!(err, RepositoryError::VersionMismatch { .. }));
}
