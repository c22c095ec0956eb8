//! # Threshold Records
//!
//! A [`Threshold`] is the jurisdiction-specific rule for one entity, keyed
//! by `(entity_id, jurisdiction_code)`. One record type covers every
//! measurement shape; which fields matter is decided by the entity's
//! observation type:
//!
//! | Shape | Fields |
//! |-------|--------|
//! | numeric | `limit_value`, `warning_value` or `warning_ratio` |
//! | zone | `zone_mapping` |
//! | endemic | `endemic_is_danger` |
//! | incidence | `incidence_warning_threshold`, `incidence_danger_threshold` |
//! | binary | none |
//!
//! Nullable limits mean "no determinable limit". The evaluation policies
//! decide what status that implies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use envsafe_core::{EntityId, JurisdictionCode, SafetyStatus};

use crate::entity::EvaluationModel;

/// Regulatory status of a threshold record.
///
/// Accepts the vocabulary of both schema generations: `active` is read as
/// [`Regulated`](Self::Regulated).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStatus {
    /// A limit is in force.
    #[default]
    #[serde(alias = "active")]
    Regulated,
    /// The substance is banned outright.
    Banned,
    /// The substance is not approved for use.
    NotApproved,
    /// No regulation applies.
    NotControlled,
    /// The rule is no longer in force.
    Historical,
    /// The rule does not apply to this jurisdiction.
    NotApplicable,
}

impl ThresholdStatus {
    /// Whether the rule is in force (`regulated`, `banned`, `not_approved`).
    pub fn is_in_force(self) -> bool {
        matches!(self, Self::Regulated | Self::Banned | Self::NotApproved)
    }

    /// Whether the rule prohibits the substance outright.
    pub fn is_prohibited(self) -> bool {
        matches!(self, Self::Banned | Self::NotApproved)
    }

    /// Snake_case identifier, matching the serde format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regulated => "regulated",
            Self::Banned => "banned",
            Self::NotApproved => "not_approved",
            Self::NotControlled => "not_controlled",
            Self::Historical => "historical",
            Self::NotApplicable => "not_applicable",
        }
    }
}

impl std::fmt::Display for ThresholdStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Jurisdiction-specific rule for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threshold {
    /// The contaminant or property this rule applies to.
    #[serde(alias = "contaminantId", alias = "propertyId")]
    pub entity_id: EntityId,
    /// The jurisdiction that issued the rule.
    pub jurisdiction_code: JurisdictionCode,
    /// Regulatory status.
    #[serde(default)]
    pub status: ThresholdStatus,
    /// Danger boundary for numeric shapes.
    #[serde(default, alias = "dangerThreshold", skip_serializing_if = "Option::is_none")]
    pub limit_value: Option<f64>,
    /// Absolute warning boundary (generalized schema).
    #[serde(default, alias = "warningThreshold", skip_serializing_if = "Option::is_none")]
    pub warning_value: Option<f64>,
    /// Warning boundary as a fraction of the limit (legacy schema).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_ratio: Option<f64>,
    /// Zone label → status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_mapping: Option<BTreeMap<String, SafetyStatus>>,
    /// Whether endemic presence is `danger` rather than `warning`.
    #[serde(default)]
    pub endemic_is_danger: bool,
    /// Incidence rate at or above which the status is `warning`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incidence_warning_threshold: Option<f64>,
    /// Incidence rate at or above which the status is `danger`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incidence_danger_threshold: Option<f64>,
    /// Free-form regulatory notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Threshold {
    /// A `regulated` rule with no shape fields set.
    pub fn new(entity_id: EntityId, jurisdiction_code: JurisdictionCode) -> Self {
        Self {
            entity_id,
            jurisdiction_code,
            status: ThresholdStatus::Regulated,
            limit_value: None,
            warning_value: None,
            warning_ratio: None,
            zone_mapping: None,
            endemic_is_danger: false,
            incidence_warning_threshold: None,
            incidence_danger_threshold: None,
            notes: None,
        }
    }

    pub fn with_status(mut self, status: ThresholdStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_limit(mut self, limit: f64) -> Self {
        self.limit_value = Some(limit);
        self
    }

    pub fn with_warning_value(mut self, warning: f64) -> Self {
        self.warning_value = Some(warning);
        self
    }

    pub fn with_warning_ratio(mut self, ratio: f64) -> Self {
        self.warning_ratio = Some(ratio);
        self
    }

    pub fn with_zone_mapping<I, S>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (S, SafetyStatus)>,
        S: Into<String>,
    {
        self.zone_mapping = Some(mapping.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    pub fn with_endemic_is_danger(mut self, endemic_is_danger: bool) -> Self {
        self.endemic_is_danger = endemic_is_danger;
        self
    }

    pub fn with_incidence(mut self, warning: Option<f64>, danger: Option<f64>) -> Self {
        self.incidence_warning_threshold = warning;
        self.incidence_danger_threshold = danger;
        self
    }
}

/// Flat threshold record as stored by the data API.
///
/// Legacy records are keyed by `contaminantId`, generalized ones by
/// `propertyId`. Zone mapping values arrive as free text and are parsed one
/// entry at a time by [`into_threshold`](Self::into_threshold).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contaminant_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<EntityId>,
    pub jurisdiction_code: JurisdictionCode,
    #[serde(default)]
    pub status: ThresholdStatus,
    #[serde(default, alias = "dangerThreshold", skip_serializing_if = "Option::is_none")]
    pub limit_value: Option<f64>,
    #[serde(default, alias = "warningThreshold", skip_serializing_if = "Option::is_none")]
    pub warning_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_mapping: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub endemic_is_danger: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incidence_warning_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incidence_danger_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ThresholdRecord {
    /// The generation and entity this record is keyed by. `None` unless
    /// exactly one of `contaminantId` and `propertyId` is set.
    pub fn key(&self) -> Option<(EvaluationModel, &EntityId)> {
        match (&self.contaminant_id, &self.property_id) {
            (Some(id), None) => Some((EvaluationModel::Legacy, id)),
            (None, Some(id)) => Some((EvaluationModel::Generalized, id)),
            _ => None,
        }
    }

    /// Convert into a typed threshold and its generation.
    ///
    /// Zone entries whose status is not `safe`, `warning` or `danger` are
    /// dropped with a warning, so that label evaluates `safe`.
    pub fn into_threshold(self) -> Option<(EvaluationModel, Threshold)> {
        let (model, entity_id) = match (self.contaminant_id, self.property_id) {
            (Some(id), None) => (EvaluationModel::Legacy, id),
            (None, Some(id)) => (EvaluationModel::Generalized, id),
            _ => return None,
        };
        let zone_mapping = self.zone_mapping.map(|mapping| {
            mapping
                .into_iter()
                .filter_map(|(label, raw)| match raw.parse::<SafetyStatus>() {
                    Ok(status) => Some((label, status)),
                    Err(_) => {
                        tracing::warn!(
                            entity = %entity_id,
                            jurisdiction = %self.jurisdiction_code,
                            %label,
                            status = %raw,
                            "dropping zone mapping entry with unknown status"
                        );
                        None
                    }
                })
                .collect()
        });
        let threshold = Threshold {
            entity_id,
            jurisdiction_code: self.jurisdiction_code,
            status: self.status,
            limit_value: self.limit_value,
            warning_value: self.warning_value,
            warning_ratio: self.warning_ratio,
            zone_mapping,
            endemic_is_danger: self.endemic_is_danger,
            incidence_warning_threshold: self.incidence_warning_threshold,
            incidence_danger_threshold: self.incidence_danger_threshold,
            notes: self.notes,
        };
        Some((model, threshold))
    }
}

/// Read access to threshold records by `(entity, jurisdiction)`.
///
/// The resolver only needs this lookup; whether the records come from a
/// live store or a static fallback table is the implementor's business.
pub trait ThresholdLookup {
    /// The threshold for exactly this pair, without any fallback.
    fn threshold(&self, entity_id: &str, jurisdiction_code: &str) -> Option<&Threshold>;
}

/// In-memory threshold table: entity → (jurisdiction → threshold).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdTable {
    by_entity: BTreeMap<EntityId, BTreeMap<JurisdictionCode, Threshold>>,
}

impl ThresholdTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a threshold, returning the record it replaced for the same key.
    pub fn insert(&mut self, threshold: Threshold) -> Option<Threshold> {
        self.by_entity
            .entry(threshold.entity_id.clone())
            .or_default()
            .insert(threshold.jurisdiction_code.clone(), threshold)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.by_entity.values().map(BTreeMap::len).sum()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }

    /// All records for one entity, keyed by jurisdiction.
    pub fn for_entity(&self, entity_id: &str) -> Option<&BTreeMap<JurisdictionCode, Threshold>> {
        self.by_entity.get(entity_id)
    }

    /// Iterate over every record.
    pub fn iter(&self) -> impl Iterator<Item = &Threshold> {
        self.by_entity.values().flat_map(BTreeMap::values)
    }
}

impl ThresholdLookup for ThresholdTable {
    fn threshold(&self, entity_id: &str, jurisdiction_code: &str) -> Option<&Threshold> {
        self.by_entity
            .get(entity_id)
            .and_then(|by_code| by_code.get(jurisdiction_code))
    }
}

impl FromIterator<Threshold> for ThresholdTable {
    fn from_iter<I: IntoIterator<Item = Threshold>>(iter: I) -> Self {
        let mut table = Self::new();
        for t in iter {
            table.insert(t);
        }
        table
    }
}
