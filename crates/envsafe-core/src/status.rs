//! # Safety Status Lattice
//!
//! [`SafetyStatus`] is the three-level classification every evaluation
//! produces. States form a total order by severity:
//!
//! ```text
//! Ordering (least → most severe): Safe < Warning < Danger
//!
//! worst(a, b) = max(a, b)  join, used to aggregate a category
//! best(a, b)  = min(a, b)  meet
//! ```
//!
//! `Danger` is absorbing under `worst`; `Safe` is the identity, which is
//! why an empty set aggregates to `Safe`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SafetyError;

/// Derived safety classification for one observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyStatus {
    /// Value is within the acceptable range, or cannot be evaluated.
    #[default]
    Safe,
    /// Value is between the warning and danger boundaries.
    Warning,
    /// Value crosses the regulatory limit, or the substance is banned.
    Danger,
}

impl SafetyStatus {
    /// Severity rank. Higher is more severe.
    fn severity(self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::Warning => 1,
            Self::Danger => 2,
        }
    }

    /// Lattice join: the more severe of the two statuses.
    pub fn worst(self, other: Self) -> Self {
        if self.severity() >= other.severity() {
            self
        } else {
            other
        }
    }

    /// Lattice meet: the less severe of the two statuses.
    pub fn best(self, other: Self) -> Self {
        if self.severity() <= other.severity() {
            self
        } else {
            other
        }
    }

    /// `true` for `Warning` and `Danger`.
    pub fn is_alert(self) -> bool {
        !matches!(self, Self::Safe)
    }

    /// All statuses in ascending severity.
    pub fn all() -> &'static [SafetyStatus] {
        &[Self::Safe, Self::Warning, Self::Danger]
    }

    /// Wire string: `"safe"`, `"warning"` or `"danger"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl PartialOrd for SafetyStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SafetyStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SafetyStatus {
    type Err = SafetyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(Self::Safe),
            "warning" => Ok(Self::Warning),
            "danger" => Ok(Self::Danger),
            other => Err(SafetyError::SchemaValidation(format!(
                "unknown safety status: {other:?}"
            ))),
        }
    }
}

/// Worst status in a set. An empty set is `Safe`.
pub fn worst_status<I>(statuses: I) -> SafetyStatus
where
    I: IntoIterator<Item = SafetyStatus>,
{
    statuses
        .into_iter()
        .fold(SafetyStatus::Safe, SafetyStatus::worst)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = SafetyStatus> {
        prop_oneof![
            Just(SafetyStatus::Safe),
            Just(SafetyStatus::Warning),
            Just(SafetyStatus::Danger),
        ]
    }

    proptest! {
        /// The aggregate is never less severe than any member.
        #[test]
        fn worst_status_dominates_members(statuses in prop::collection::vec(any_status(), 0..16)) {
            let agg = worst_status(statuses.iter().copied());
            for s in &statuses {
                prop_assert!(agg >= *s);
            }
        }

        /// The aggregate is a member of the set, or `Safe` for an empty set.
        #[test]
        fn worst_status_is_a_member(statuses in prop::collection::vec(any_status(), 0..16)) {
            let agg = worst_status(statuses.iter().copied());
            prop_assert!((statuses.is_empty() && agg == SafetyStatus::Safe) || statuses.contains(&agg));
        }
    }
}
