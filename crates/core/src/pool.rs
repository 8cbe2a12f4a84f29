// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Robot pools: named groupings used to scope dispatch to a subset of the fleet.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

crate::define_id! {
    /// Unique identifier for a robot pool.
    pub struct PoolId("pool");
}

/// A named group of robots selected by tag match. Membership is computed,
/// not stored — a robot belongs to a pool whenever its tags are a superset
/// of the pool's `required_tags`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotPool {
    pub id: PoolId,
    pub name: String,
    pub required_tags: BTreeSet<String>,
    pub description: Option<String>,
}

impl RobotPool {
    pub fn new(id: PoolId, name: impl Into<String>, required_tags: BTreeSet<String>) -> Self {
        Self { id, name: name.into(), required_tags, description: None }
    }

    /// Whether a robot with the given tags belongs to this pool.
    pub fn matches(&self, robot_tags: &BTreeSet<String>) -> bool {
        self.required_tags.is_subset(robot_tags)
    }
}

crate::builder! {
    pub struct RobotPoolBuilder => RobotPool {
        into {
            name: String = "test-pool",
        }
        set {
            required_tags: std::collections::BTreeSet<String> = std::collections::BTreeSet::new(),
        }
        option {
            description: String = None,
        }
        computed {
            id: PoolId = PoolId::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_requires_tag_superset() {
        let pool = RobotPool::builder().required_tags(tags(&["finance", "windows"])).build();
        assert!(pool.matches(&tags(&["finance", "windows", "gpu"])));
        assert!(!pool.matches(&tags(&["finance"])));
    }

    #[test]
    fn empty_required_tags_matches_everything() {
        let pool = RobotPool::builder().build();
        assert!(pool.matches(&tags(&[])));
        assert!(pool.matches(&tags(&["anything"])));
    }
}
