// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::EngineError;
use orc_core::{FakeClock, JobSpec};
use orc_storage::InMemoryRepository;
use std::collections::BTreeSet;

fn harness(strategy: LoadBalancingStrategy) -> (Arc<Queue<FakeClock>>, Arc<Fleet<FakeClock>>, Dispatcher<FakeClock>) {
    let clock = FakeClock::new();
    let queue = Arc::new(Queue::new(Arc::new(InMemoryRepository::new()), clock.clone(), chrono::Duration::seconds(300), 100));
    let fleet = Arc::new(Fleet::new(Arc::new(InMemoryRepository::new()), clock, chrono::Duration::seconds(60)));
    let dispatcher = Dispatcher::new(queue.clone(), fleet.clone(), strategy);
    (queue, fleet, dispatcher)
}

#[test]
fn tick_skips_jobs_with_no_eligible_robot() {
    let (queue, _fleet, dispatcher) = harness(LoadBalancingStrategy::RoundRobin);
    queue.submit(JobSpec::builder("wf-1").build(), None, false, None).unwrap();
    assert!(dispatcher.tick().is_empty());
}

#[test]
fn tick_assigns_job_and_marks_robot_busy() -> Result<(), EngineError> {
    let (queue, fleet, dispatcher) = harness(LoadBalancingStrategy::RoundRobin);
    let id = queue.submit(JobSpec::builder("wf-1").build(), None, false, None)?;
    let robot_id = fleet.register(RobotId::new(), "r1", BTreeSet::new(), BTreeSet::new(), 1).unwrap();

    let assignments = dispatcher.tick();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].job.id, id);
    assert_eq!(assignments[0].robot_id, robot_id);
    assert_eq!(fleet.get(robot_id).unwrap().current_jobs, 1);
    Ok(())
}

#[test]
fn target_robot_id_restricts_dispatch_to_that_robot() -> Result<(), EngineError> {
    let (queue, fleet, dispatcher) = harness(LoadBalancingStrategy::RoundRobin);
    let other = fleet.register(RobotId::new(), "other", BTreeSet::new(), BTreeSet::new(), 1).unwrap();
    let target = fleet.register(RobotId::new(), "target", BTreeSet::new(), BTreeSet::new(), 1).unwrap();
    let id = queue.submit(JobSpec::builder("wf-1").target_robot_id(target).build(), None, false, None)?;

    let assignments = dispatcher.tick();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].job.id, id);
    assert_eq!(assignments[0].robot_id, target);
    assert_ne!(assignments[0].robot_id, other);
    Ok(())
}

#[test]
fn required_tags_exclude_non_matching_robots() -> Result<(), EngineError> {
    let (queue, fleet, dispatcher) = harness(LoadBalancingStrategy::RoundRobin);
    fleet.register(RobotId::new(), "plain", BTreeSet::new(), BTreeSet::new(), 1).unwrap();
    let tagged = fleet.register(RobotId::new(), "sap", BTreeSet::from(["sap".to_string()]), BTreeSet::new(), 1).unwrap();

    queue.submit(
        JobSpec::builder("wf-1").required_tags(BTreeSet::from(["sap".to_string()])).build(),
        None,
        false,
        None,
    )?;

    let assignments = dispatcher.tick();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].robot_id, tagged);
    Ok(())
}

#[test]
fn least_loaded_prefers_lower_relative_load() -> Result<(), EngineError> {
    let (queue, fleet, dispatcher) = harness(LoadBalancingStrategy::LeastLoaded);
    let busy = fleet.register(RobotId::new(), "busy", BTreeSet::new(), BTreeSet::new(), 2).unwrap();
    fleet.record_assign(busy);
    let idle = fleet.register(RobotId::new(), "idle", BTreeSet::new(), BTreeSet::new(), 2).unwrap();

    queue.submit(JobSpec::builder("wf-1").build(), None, false, None)?;
    let assignments = dispatcher.tick();
    assert_eq!(assignments[0].robot_id, idle);
    Ok(())
}

#[test]
fn affinity_prefers_last_successful_robot() -> Result<(), EngineError> {
    let (queue, fleet, dispatcher) = harness(LoadBalancingStrategy::Affinity);
    let affine = fleet.register(RobotId::new(), "affine", BTreeSet::new(), BTreeSet::new(), 2).unwrap();
    fleet.record_assign(affine);
    fleet.record_release(affine, Some("wf-1"));
    fleet.register(RobotId::new(), "cold", BTreeSet::new(), BTreeSet::new(), 2).unwrap();

    queue.submit(JobSpec::builder("wf-1").build(), None, false, None)?;
    let assignments = dispatcher.tick();
    assert_eq!(assignments[0].robot_id, affine);
    Ok(())
}

#[test]
fn round_robin_alternates_across_ticks() -> Result<(), EngineError> {
    let (queue, fleet, dispatcher) = harness(LoadBalancingStrategy::RoundRobin);
    let a = fleet.register(RobotId::new(), "a", BTreeSet::new(), BTreeSet::new(), 10).unwrap();
    let b = fleet.register(RobotId::new(), "b", BTreeSet::new(), BTreeSet::new(), 10).unwrap();

    queue.submit(JobSpec::builder("wf-1").build(), None, false, None)?;
    let first = dispatcher.tick()[0].robot_id;

    queue.submit(JobSpec::builder("wf-2").build(), None, false, None)?;
    let second = dispatcher.tick()[0].robot_id;

    assert_ne!(first, second);
    assert!([a, b].contains(&first));
    assert!([a, b].contains(&second));
    Ok(())
}
