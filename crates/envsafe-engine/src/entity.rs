//! # Entity Definitions
//!
//! What is measured. Two generations of the same concept coexist:
//!
//! - [`Contaminant`]: the legacy schema. Always numeric.
//! - [`ObservedProperty`]: the generalized schema. Carries an
//!   [`ObservationType`] that selects which observation and threshold
//!   fields are meaningful.
//!
//! `higher_is_bad` is the polarity: for most entities a larger value is
//! worse, but for some (healthcare access %) a low value is dangerous.

use serde::{Deserialize, Serialize};

use envsafe_core::{EntityId, SafetyCategory};

fn default_true() -> bool {
    true
}

/// Which measurement shape an observed property uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationType {
    /// A number compared against a limit and a warning boundary.
    Numeric,
    /// A categorical label mapped to a status (e.g. AQI band).
    Zone,
    /// Presence or absence of an endemic disease.
    Endemic,
    /// A rate compared against incidence boundaries.
    Incidence,
    /// A yes/no advisory.
    Binary,
    /// Any tag this build does not know. Evaluates `safe`.
    #[serde(other)]
    Unrecognized,
}

impl ObservationType {
    /// Snake_case identifier, matching the serde format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Zone => "zone",
            Self::Endemic => "endemic",
            Self::Incidence => "incidence",
            Self::Binary => "binary",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for ObservationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which schema generation an entity, threshold or evaluated record
/// belongs to. The two generations are separate key spaces: a contaminant
/// and a property may share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationModel {
    /// A [`Contaminant`], evaluated by `LegacyContaminantPolicy`.
    Legacy,
    /// An [`ObservedProperty`], evaluated by `ObservationPolicy`.
    Generalized,
}

impl EvaluationModel {
    /// Snake_case identifier, matching the serde format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Generalized => "generalized",
        }
    }
}

impl std::fmt::Display for EvaluationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legacy contaminant definition. Implicitly numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contaminant {
    /// Stable identifier.
    pub id: EntityId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Category the contaminant is shown under.
    #[serde(default = "default_water")]
    pub category: SafetyCategory,
    /// Polarity. Defaults to `true`.
    #[serde(default = "default_true")]
    pub higher_is_bad: bool,
    /// Measurement unit, e.g. `"ppb"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

fn default_water() -> SafetyCategory {
    SafetyCategory::Water
}

impl Contaminant {
    /// A water contaminant where higher values are worse.
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            category: SafetyCategory::Water,
            higher_is_bad: true,
            unit: None,
        }
    }

    /// Set the polarity.
    pub fn with_higher_is_bad(mut self, higher_is_bad: bool) -> Self {
        self.higher_is_bad = higher_is_bad;
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: SafetyCategory) -> Self {
        self.category = category;
        self
    }
}

/// Generalized observed property definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedProperty {
    /// Stable identifier.
    pub id: EntityId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Category the property is shown under.
    pub category: SafetyCategory,
    /// Polarity. Defaults to `true`.
    #[serde(default = "default_true")]
    pub higher_is_bad: bool,
    /// Measurement shape. Fixed per property.
    pub observation_type: ObservationType,
    /// Measurement unit, e.g. `"%"`, `"cases per 100k"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ObservedProperty {
    /// A property where higher values are worse.
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        category: SafetyCategory,
        observation_type: ObservationType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            higher_is_bad: true,
            observation_type,
            unit: None,
        }
    }

    /// Set the polarity.
    pub fn with_higher_is_bad(mut self, higher_is_bad: bool) -> Self {
        self.higher_is_bad = higher_is_bad;
        self
    }

    /// Set the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}
