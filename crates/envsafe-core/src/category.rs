//! # Safety Category — Single Source of Truth
//!
//! Defines the [`SafetyCategory`] enum used to group indicators on a
//! location's safety page. Every `match` on it must be exhaustive.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SafetyError;

/// Indicator groups shown for a location.
///
/// | Category | Examples |
/// |----------|----------|
/// | Water | lead, nitrate, PFAS, E. coli |
/// | Air | AQI, PM2.5, ozone |
/// | Health | Lyme endemicity, disease incidence, healthcare access |
/// | Disaster | flood zone, wildfire risk, boil-water advisory |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCategory {
    /// Drinking water contaminants.
    Water,
    /// Air quality.
    Air,
    /// Disease presence, incidence and healthcare indicators.
    Health,
    /// Natural hazard zones and advisories.
    Disaster,
}

/// Total number of safety categories.
pub const SAFETY_CATEGORY_COUNT: usize = 4;

impl SafetyCategory {
    /// All categories in display order.
    pub fn all() -> &'static [SafetyCategory] {
        &[Self::Water, Self::Air, Self::Health, Self::Disaster]
    }

    /// Snake_case identifier, matching the serde format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Air => "air",
            Self::Health => "health",
            Self::Disaster => "disaster",
        }
    }
}

impl std::fmt::Display for SafetyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SafetyCategory {
    type Err = SafetyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "water" => Ok(Self::Water),
            "air" => Ok(Self::Air),
            "health" => Ok(Self::Health),
            "disaster" => Ok(Self::Disaster),
            other => Err(SafetyError::SchemaValidation(format!(
                "unknown safety category: {other:?}"
            ))),
        }
    }
}
