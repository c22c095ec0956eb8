//! # Identifier Newtypes
//!
//! [`JurisdictionCode`] addresses a regulatory region (e.g. `"US-NY"`,
//! `"WHO"`). [`EntityId`] addresses a contaminant or observed property
//! (e.g. `"lead"`, `"aqi"`). The two are distinct types so a threshold key
//! cannot be built with its halves swapped.
//!
//! ## Validation
//!
//! Both are validated to be non-empty after trimming, at construction and
//! at deserialization time.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Implements `Deserialize` for a string newtype by routing the raw string
/// through the type's validating `new()` constructor.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// A jurisdiction code, typically an ISO 3166 code with optional
/// subdivision suffix (`"US"`, `"US-NY"`, `"CA-ON"`) or a designated global
/// code such as `"WHO"`.
///
/// Codes are compared exactly; no case folding is applied because
/// jurisdiction naming is owned by the administrators who enter it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct JurisdictionCode(String);

impl JurisdictionCode {
    /// Create a jurisdiction code, validating non-emptiness.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidJurisdictionCode`] if the string is
    /// empty or whitespace-only.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidJurisdictionCode);
        }
        Ok(Self(trimmed))
    }

    /// Access the code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_validating_deserialize!(JurisdictionCode);

impl fmt::Display for JurisdictionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for JurisdictionCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for JurisdictionCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Stable identifier of a contaminant or observed property.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create an entity identifier, validating non-emptiness.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEntityId`] if the string is empty
    /// or whitespace-only.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidEntityId);
        }
        Ok(Self(trimmed))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_validating_deserialize!(EntityId);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for EntityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
