//! # Location Assessment
//!
//! Evaluates everything recorded for one jurisdiction and folds the
//! results into a per-category summary:
//!
//! ```text
//! observations ─┐                       ┌─▶ water    ─┐
//!               ├─▶ resolve ─▶ evaluate ├─▶ air       ├─▶ overall
//! measurements ─┘                       ├─▶ health    │
//!                                       └─▶ disaster ─┘
//! ```
//!
//! Each category is the worst status of its records. A category with no
//! records is `safe`, as is the overall status of an empty report.
//! Generalized observations go through [`ObservationPolicy`]; legacy
//! measurements go through [`LegacyContaminantPolicy`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use envsafe_core::{worst_status, EntityId, JurisdictionCode, SafetyCategory, SafetyStatus};

use crate::config::EngineConfig;
use crate::entity::EvaluationModel;
use crate::evaluation::{LegacyContaminantPolicy, ObservationPolicy, StatusPolicy};
use crate::observation::{Measurement, Observation};
use crate::resolver::{Resolution, ResolutionTier, ThresholdResolver};
use crate::source::SafetyDataSource;

/// One evaluated observation or measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedRecord {
    pub entity_id: EntityId,
    pub entity_name: String,
    pub category: SafetyCategory,
    pub model: EvaluationModel,
    pub status: SafetyStatus,
    /// `None` when no threshold was found anywhere in the chain.
    pub tier: Option<ResolutionTier>,
    pub threshold_jurisdiction: Option<JurisdictionCode>,
    pub recorded_at: DateTime<Utc>,
    /// The record carried a cached status that differs from `status`.
    pub stale: bool,
}

/// Everything evaluated for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationReport {
    pub jurisdiction: JurisdictionCode,
    pub records: Vec<EvaluatedRecord>,
    category_status: BTreeMap<SafetyCategory, SafetyStatus>,
    overall: SafetyStatus,
}

impl LocationReport {
    /// Build a report from evaluated records.
    pub fn new(jurisdiction: JurisdictionCode, records: Vec<EvaluatedRecord>) -> Self {
        let category_status = SafetyCategory::all()
            .iter()
            .map(|&category| {
                let status = worst_status(
                    records
                        .iter()
                        .filter(|r| r.category == category)
                        .map(|r| r.status),
                );
                (category, status)
            })
            .collect();
        let overall = worst_status(records.iter().map(|r| r.status));
        Self {
            jurisdiction,
            records,
            category_status,
            overall,
        }
    }

    /// Worst status in `category`.
    pub fn category(&self, category: SafetyCategory) -> SafetyStatus {
        self.category_status
            .get(&category)
            .copied()
            .unwrap_or_default()
    }

    /// Worst status per category. Every category is present.
    pub fn categories(&self) -> &BTreeMap<SafetyCategory, SafetyStatus> {
        &self.category_status
    }

    /// Worst status across all records.
    pub fn overall(&self) -> SafetyStatus {
        self.overall
    }

    /// The most recent record for each entity, keyed by generation and id.
    /// On equal timestamps the later record in [`records`](Self::records)
    /// wins.
    pub fn latest_by_entity(&self) -> BTreeMap<(EvaluationModel, &EntityId), &EvaluatedRecord> {
        let mut latest: BTreeMap<(EvaluationModel, &EntityId), &EvaluatedRecord> = BTreeMap::new();
        for record in &self.records {
            let key = (record.model, &record.entity_id);
            let superseded = latest
                .get(&key)
                .is_some_and(|existing| existing.recorded_at > record.recorded_at);
            if !superseded {
                latest.insert(key, record);
            }
        }
        latest
    }

    /// Records whose status is `warning` or `danger`.
    pub fn alerts(&self) -> impl Iterator<Item = &EvaluatedRecord> {
        self.records.iter().filter(|r| r.status.is_alert())
    }

    /// Records whose cached status no longer matches.
    pub fn stale_records(&self) -> impl Iterator<Item = &EvaluatedRecord> {
        self.records.iter().filter(|r| r.stale)
    }
}

/// Resolves and evaluates records from a [`SafetyDataSource`].
pub struct LocationAssessor<'s, S: SafetyDataSource + ?Sized> {
    source: &'s S,
    resolver: ThresholdResolver,
    legacy: LegacyContaminantPolicy,
    generalized: ObservationPolicy,
}

impl<S: SafetyDataSource + ?Sized> std::fmt::Debug for LocationAssessor<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationAssessor")
            .field("resolver", &self.resolver)
            .field("legacy", &self.legacy)
            .finish_non_exhaustive()
    }
}

impl<'s, S: SafetyDataSource + ?Sized> LocationAssessor<'s, S> {
    /// Create an assessor over `source`.
    pub fn new(source: &'s S, config: &EngineConfig) -> Self {
        Self {
            source,
            resolver: ThresholdResolver::from_config(config),
            legacy: LegacyContaminantPolicy::from_config(config),
            generalized: ObservationPolicy,
        }
    }

    /// Evaluate every observation and measurement recorded in `jurisdiction`.
    pub fn assess(&self, jurisdiction: &JurisdictionCode) -> LocationReport {
        let observations = self.source.observations_in(jurisdiction.as_str());
        let measurements = self.source.measurements_in(jurisdiction.as_str());

        let mut records = Vec::with_capacity(observations.len() + measurements.len());
        records.extend(
            observations
                .into_iter()
                .filter_map(|obs| self.evaluate_observation(obs)),
        );
        records.extend(
            measurements
                .into_iter()
                .filter_map(|m| self.evaluate_measurement(m)),
        );

        let report = LocationReport::new(jurisdiction.clone(), records);
        tracing::debug!(
            jurisdiction = %jurisdiction,
            records = report.records.len(),
            overall = %report.overall(),
            "location assessed"
        );
        report
    }

    /// Evaluate one generalized observation. `None` if its property is not
    /// defined in the source.
    pub fn evaluate_observation(&self, observation: &Observation) -> Option<EvaluatedRecord> {
        let Some(property) = self.source.property(observation.property_id.as_str()) else {
            tracing::warn!(
                property = %observation.property_id,
                "skipping observation for unknown property"
            );
            return None;
        };

        let resolution = self.resolver.resolve_with_provenance(
            &observation.property_id,
            &observation.jurisdiction_code,
            self.source.property_thresholds(),
            self.source,
        );
        let threshold = resolution.as_ref().map(|r| r.threshold);
        let status = self
            .generalized
            .evaluate(observation.value.as_ref(), property, threshold);

        Some(record(
            property.id.clone(),
            property.name.clone(),
            property.category,
            EvaluationModel::Generalized,
            status,
            resolution,
            observation.observed_at,
            observation.stored_status,
        ))
    }

    /// Evaluate one legacy measurement. `None` if its contaminant is not
    /// defined in the source.
    pub fn evaluate_measurement(&self, measurement: &Measurement) -> Option<EvaluatedRecord> {
        let Some(contaminant) = self.source.contaminant(measurement.contaminant_id.as_str()) else {
            tracing::warn!(
                contaminant = %measurement.contaminant_id,
                "skipping measurement for unknown contaminant"
            );
            return None;
        };

        let resolution = self.resolver.resolve_with_provenance(
            &measurement.contaminant_id,
            &measurement.jurisdiction_code,
            self.source.contaminant_thresholds(),
            self.source,
        );
        let threshold = resolution.as_ref().map(|r| r.threshold);
        let status = self
            .legacy
            .evaluate(measurement.value.as_ref(), contaminant, threshold);

        Some(record(
            contaminant.id.clone(),
            contaminant.name.clone(),
            contaminant.category,
            EvaluationModel::Legacy,
            status,
            resolution,
            measurement.measured_at,
            measurement.stored_status,
        ))
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    entity_id: EntityId,
    entity_name: String,
    category: SafetyCategory,
    model: EvaluationModel,
    status: SafetyStatus,
    resolution: Option<Resolution<'_>>,
    recorded_at: DateTime<Utc>,
    stored_status: Option<SafetyStatus>,
) -> EvaluatedRecord {
    let stale = stored_status.is_some_and(|cached| cached != status);
    if stale {
        tracing::debug!(
            entity = %entity_id,
            ?stored_status,
            %status,
            "cached status is stale"
        );
    }
    let (tier, threshold_jurisdiction) = match resolution {
        Some(r) => (Some(r.tier), Some(r.matched_jurisdiction)),
        None => (None, None),
    };
    EvaluatedRecord {
        entity_id,
        entity_name,
        category,
        model,
        status,
        tier,
        threshold_jurisdiction,
        recorded_at,
        stale,
    }
}
