// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job dispatch priority.

use serde::{Deserialize, Serialize};

/// Dispatch priority for a job. Higher variants are dequeued first.
///
/// Ordering is derived from declaration order, so `Priority::Critical >
/// Priority::Low` holds and sorting a `Vec<Priority>` ascending yields
/// `[Low, Normal, High, Critical]` — callers that need dequeue order
/// (critical first) should iterate [`Priority::DEQUEUE_ORDER`] or reverse-sort.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

impl Priority {
    /// Priority buckets in the order the queue scans them when dequeuing.
    pub const DEQUEUE_ORDER: [Priority; 4] =
        [Priority::Critical, Priority::High, Priority::Normal, Priority::Low];
}

crate::simple_display! {
    Priority {
        Low => "low",
        Normal => "normal",
        High => "high",
        Critical => "critical",
    }
}

impl std::str::FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(InvalidPriority(other.to_string())),
        }
    }
}

/// An unrecognised priority string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid priority: {0}")]
pub struct InvalidPriority(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dequeue_order_is_highest_first() {
        assert_eq!(Priority::DEQUEUE_ORDER[0], Priority::Critical);
        assert_eq!(Priority::DEQUEUE_ORDER[3], Priority::Low);
    }

    #[test]
    fn ord_matches_declaration_order() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
    }

    #[test]
    fn from_str_round_trips_display() {
        for p in Priority::DEQUEUE_ORDER {
            assert_eq!(p.to_string().parse::<Priority>().unwrap(), p);
        }
    }

    #[test]
    fn from_str_rejects_unknown() {
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn default_is_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
    }
}
