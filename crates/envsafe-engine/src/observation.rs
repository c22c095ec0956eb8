//! # Observations & Measurements
//!
//! An [`Observation`] is one recorded value for an observed property at a
//! location and time. Its value is an [`ObservationValue`], a tagged union
//! with one variant per measurement shape, so the evaluator matches on the
//! shape instead of probing a bag of optional fields.
//!
//! Records arriving from the data API are flat ([`ObservationRecord`]):
//! one optional field per shape. [`ObservationValue::from_record`] picks the
//! field that matches the property's declared type. A wrong-shaped or
//! missing field yields `None`, which every shape evaluates as `safe`.
//!
//! A [`Measurement`] is the legacy numeric-only equivalent.
//!
//! Any stored status on these records is a cache. The derived status is
//! recomputed from value and threshold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use envsafe_core::{EntityId, JurisdictionCode, SafetyStatus};

use crate::entity::ObservationType;

/// An observed value in one of the five measurement shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ObservationValue {
    /// A measured number.
    Numeric(f64),
    /// A categorical zone label.
    Zone(String),
    /// Whether the disease is endemic.
    Endemic(bool),
    /// A rate, e.g. cases per 100k.
    Incidence(f64),
    /// Whether an advisory is in effect.
    Binary(bool),
}

impl ObservationValue {
    /// The measurement shape of this value.
    pub fn shape(&self) -> ObservationType {
        match self {
            Self::Numeric(_) => ObservationType::Numeric,
            Self::Zone(_) => ObservationType::Zone,
            Self::Endemic(_) => ObservationType::Endemic,
            Self::Incidence(_) => ObservationType::Incidence,
            Self::Binary(_) => ObservationType::Binary,
        }
    }

    /// Pick the value matching `observation_type` from a flat API record.
    pub fn from_record(
        observation_type: ObservationType,
        record: &ObservationRecord,
    ) -> Option<Self> {
        match observation_type {
            ObservationType::Numeric => record.numeric_value.map(Self::Numeric),
            ObservationType::Zone => record.zone_value.clone().map(Self::Zone),
            ObservationType::Endemic => record.endemic_value.map(Self::Endemic),
            ObservationType::Incidence => record.incidence_value.map(Self::Incidence),
            ObservationType::Binary => record.binary_value.map(Self::Binary),
            ObservationType::Unrecognized => None,
        }
    }
}

/// Where a value was recorded. City/state/country for the generalized
/// schema, postal code for the legacy one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, alias = "zipCode", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Where a value came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Flat observation record as stored by the data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    pub property_id: EntityId,
    /// Jurisdiction of the location, resolved upstream.
    pub jurisdiction_code: JurisdictionCode,
    #[serde(default)]
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endemic_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incidence_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_value: Option<bool>,
    pub observed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub provenance: Provenance,
    #[serde(default, alias = "status", skip_serializing_if = "Option::is_none")]
    pub stored_status: Option<SafetyStatus>,
}

/// A typed observation for one observed property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub property_id: EntityId,
    /// Jurisdiction of the location, resolved upstream.
    pub jurisdiction_code: JurisdictionCode,
    #[serde(default)]
    pub location: Location,
    /// `None` when the record carries no value of the declared shape.
    pub value: Option<ObservationValue>,
    pub observed_at: DateTime<Utc>,
    #[serde(default)]
    pub provenance: Provenance,
    /// Previously computed status. A cache, never authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_status: Option<SafetyStatus>,
}

impl Observation {
    /// An observation with no location detail, provenance or cached status.
    pub fn new(
        property_id: EntityId,
        jurisdiction_code: JurisdictionCode,
        value: Option<ObservationValue>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            property_id,
            jurisdiction_code,
            location: Location::default(),
            value,
            observed_at,
            provenance: Provenance::default(),
            stored_status: None,
        }
    }

    /// Convert a flat API record, keeping only the field that matches the
    /// property's declared type.
    pub fn from_record(record: ObservationRecord, observation_type: ObservationType) -> Self {
        let value = ObservationValue::from_record(observation_type, &record);
        Self {
            property_id: record.property_id,
            jurisdiction_code: record.jurisdiction_code,
            location: record.location,
            value,
            observed_at: record.observed_at,
            provenance: record.provenance,
            stored_status: record.stored_status,
        }
    }

    pub fn with_stored_status(mut self, status: SafetyStatus) -> Self {
        self.stored_status = Some(status);
        self
    }
}

/// Legacy contaminant measurement. Numeric only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub contaminant_id: EntityId,
    /// Jurisdiction of the location, resolved upstream.
    pub jurisdiction_code: JurisdictionCode,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub value: Option<f64>,
    pub measured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub provenance: Provenance,
    #[serde(default, alias = "status", skip_serializing_if = "Option::is_none")]
    pub stored_status: Option<SafetyStatus>,
}

impl Measurement {
    pub fn new(
        contaminant_id: EntityId,
        jurisdiction_code: JurisdictionCode,
        value: Option<f64>,
        measured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            contaminant_id,
            jurisdiction_code,
            location: Location::default(),
            value,
            measured_at,
            provenance: Provenance::default(),
            stored_status: None,
        }
    }

    pub fn with_stored_status(mut self, status: SafetyStatus) -> Self {
        self.stored_status = Some(status);
        self
    }
}
