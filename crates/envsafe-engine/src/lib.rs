//! # envsafe-engine — Threshold Resolution & Status Evaluation
//!
//! Turns a recorded value into a safety status. Two steps, both pure:
//!
//! ```text
//! resolve(entity, jurisdiction) : exact ─▶ parent chain ─▶ default ─▶ Option<&Threshold>
//! evaluate(value, entity, threshold) : ─▶ SafetyStatus
//! ```
//!
//! The resolver walks the jurisdiction parent chain as a bounded loop. The
//! evaluator comes in two policies that disagree on a missing threshold:
//! [`ObservationPolicy`] (generalized properties, missing means `safe`) and
//! [`LegacyContaminantPolicy`] (legacy contaminants, missing means
//! `danger`). They share the [`StatusPolicy`] trait and are never merged.
//!
//! Observation values are the [`ObservationValue`] sum type. A value whose
//! shape does not match the property's declared type is treated as absent.
//!
//! ## Data Access
//!
//! Nothing in this crate performs I/O during evaluation. Records come from
//! a caller-supplied [`SafetyDataSource`]; [`StaticDataSource`] is the
//! offline implementation built from a JSON or YAML [`Snapshot`].
//!
//! ## Crate Policy
//!
//! - Depends only on `envsafe-core` internally.
//! - Resolution and evaluation never fail. "Cannot determine" folds into
//!   the policy's default status.
//! - No `.unwrap()` outside tests.

pub mod assessment;
pub mod config;
pub mod entity;
pub mod evaluation;
pub mod observation;
pub mod resolver;
pub mod source;
pub mod threshold;

// Re-export primary types.
pub use assessment::{EvaluatedRecord, LocationAssessor, LocationReport};
pub use config::{ConfigError, EngineConfig, DEFAULT_WARNING_RATIO};
pub use entity::{Contaminant, EvaluationModel, ObservationType, ObservedProperty};
pub use evaluation::{
    classify_numeric, evaluate_measurement, evaluate_observation, LegacyContaminantPolicy,
    ObservationPolicy, StatusPolicy,
};
pub use observation::{
    Location, Measurement, Observation, ObservationRecord, ObservationValue, Provenance,
};
pub use resolver::{resolve, JurisdictionLookup, Resolution, ResolutionTier, ThresholdResolver};
pub use source::{SafetyDataSource, Snapshot, SourceError, SourceResult, StaticDataSource};
pub use threshold::{Threshold, ThresholdLookup, ThresholdRecord, ThresholdStatus, ThresholdTable};
