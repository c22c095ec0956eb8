//! # Data Sources
//!
//! The engine never fetches anything itself. Callers hand it a
//! [`SafetyDataSource`]: a live store adapter, or the [`StaticDataSource`]
//! built from a serialized [`Snapshot`] for offline and development use.
//! The resolver and evaluators cannot tell the two apart.
//!
//! Snapshots are camelCase JSON or YAML with the field names of the managed
//! data API. Loading a snapshot fails on duplicate keys. Records that point
//! at entities the snapshot does not define are dropped with a warning.
//!
//! Contaminant and property thresholds are held in separate tables. The
//! two schema generations may reuse an id while data is migrated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use envsafe_core::{ChainWalk, EntityId, Jurisdiction, JurisdictionCode, JurisdictionTable};

use crate::entity::{Contaminant, EvaluationModel, ObservedProperty};
use crate::observation::{Measurement, Observation, ObservationRecord};
use crate::resolver::JurisdictionLookup;
use crate::threshold::{ThresholdLookup, ThresholdRecord, ThresholdTable};

/// Errors raised while building a data source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// YAML parsing failed.
    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// JSON parsing failed.
    #[error("failed to parse JSON at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The snapshot file does not exist.
    #[error("snapshot file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Two thresholds of one generation share an `(entity, jurisdiction)` key.
    #[error("duplicate {model} threshold for {entity} in {jurisdiction}")]
    DuplicateThreshold {
        model: EvaluationModel,
        entity: EntityId,
        jurisdiction: JurisdictionCode,
    },

    /// A threshold names neither or both of `contaminantId` and `propertyId`.
    #[error("threshold in {jurisdiction} must name exactly one of contaminantId or propertyId")]
    AmbiguousThreshold { jurisdiction: JurisdictionCode },

    /// Two entity definitions of the same kind share an id.
    #[error("duplicate {kind} definition: {id}")]
    DuplicateEntity { kind: &'static str, id: EntityId },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (not file-specific).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error (not file-specific).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for data source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Everything the engine reads, behind one capability.
///
/// Lookups are exact. Fallback through the jurisdiction chain is the
/// resolver's job.
pub trait SafetyDataSource: JurisdictionLookup {
    /// Thresholds keyed by contaminant id.
    fn contaminant_thresholds(&self) -> &dyn ThresholdLookup;

    /// Thresholds keyed by observed property id.
    fn property_thresholds(&self) -> &dyn ThresholdLookup;

    /// A generalized property definition by id.
    fn property(&self, id: &str) -> Option<&ObservedProperty>;

    /// A legacy contaminant definition by id.
    fn contaminant(&self, id: &str) -> Option<&Contaminant>;

    /// A jurisdiction by code.
    fn jurisdiction(&self, code: &str) -> Option<&Jurisdiction>;

    /// Observations recorded at locations in `code`.
    fn observations_in(&self, code: &str) -> Vec<&Observation>;

    /// Legacy measurements recorded at locations in `code`.
    fn measurements_in(&self, code: &str) -> Vec<&Measurement>;
}

/// A serialized static dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub jurisdictions: Vec<Jurisdiction>,
    pub properties: Vec<ObservedProperty>,
    pub contaminants: Vec<Contaminant>,
    pub thresholds: Vec<ThresholdRecord>,
    pub observations: Vec<ObservationRecord>,
    pub measurements: Vec<Measurement>,
}

/// In-memory data source built from a [`Snapshot`].
#[derive(Debug, Clone, Default)]
pub struct StaticDataSource {
    jurisdictions: JurisdictionTable,
    properties: BTreeMap<EntityId, ObservedProperty>,
    contaminants: BTreeMap<EntityId, Contaminant>,
    contaminant_thresholds: ThresholdTable,
    property_thresholds: ThresholdTable,
    observations: BTreeMap<JurisdictionCode, Vec<Observation>>,
    measurements: BTreeMap<JurisdictionCode, Vec<Measurement>>,
}

impl StaticDataSource {
    /// Index a snapshot.
    ///
    /// Observation records are converted to typed observations using the
    /// declared type of their property.
    pub fn from_snapshot(snapshot: Snapshot) -> SourceResult<Self> {
        let jurisdictions = JurisdictionTable::new(snapshot.jurisdictions);
        for problem in jurisdictions.validate() {
            tracing::warn!(%problem, "snapshot jurisdiction table problem");
        }

        let mut properties = BTreeMap::new();
        for property in snapshot.properties {
            let id = property.id.clone();
            if properties.insert(id.clone(), property).is_some() {
                return Err(SourceError::DuplicateEntity {
                    kind: "property",
                    id,
                });
            }
        }

        let mut contaminants = BTreeMap::new();
        for contaminant in snapshot.contaminants {
            let id = contaminant.id.clone();
            if contaminants.insert(id.clone(), contaminant).is_some() {
                return Err(SourceError::DuplicateEntity {
                    kind: "contaminant",
                    id,
                });
            }
        }

        let mut contaminant_thresholds = ThresholdTable::new();
        let mut property_thresholds = ThresholdTable::new();
        for record in snapshot.thresholds {
            let jurisdiction = record.jurisdiction_code.clone();
            let Some((model, threshold)) = record.into_threshold() else {
                return Err(SourceError::AmbiguousThreshold { jurisdiction });
            };
            let entity = threshold.entity_id.clone();
            let (table, defined) = match model {
                EvaluationModel::Legacy => (
                    &mut contaminant_thresholds,
                    contaminants.contains_key(&entity),
                ),
                EvaluationModel::Generalized => {
                    (&mut property_thresholds, properties.contains_key(&entity))
                }
            };
            if !defined {
                tracing::warn!(%entity, %jurisdiction, %model, "threshold for undefined entity");
            }
            if table.insert(threshold).is_some() {
                return Err(SourceError::DuplicateThreshold {
                    model,
                    entity,
                    jurisdiction,
                });
            }
        }

        let mut observations: BTreeMap<JurisdictionCode, Vec<Observation>> = BTreeMap::new();
        for record in snapshot.observations {
            let Some(property) = properties.get(&record.property_id) else {
                tracing::warn!(
                    property = %record.property_id,
                    jurisdiction = %record.jurisdiction_code,
                    "dropping observation for undefined property"
                );
                continue;
            };
            let observation = Observation::from_record(record, property.observation_type);
            observations
                .entry(observation.jurisdiction_code.clone())
                .or_default()
                .push(observation);
        }

        let mut measurements: BTreeMap<JurisdictionCode, Vec<Measurement>> = BTreeMap::new();
        for measurement in snapshot.measurements {
            if !contaminants.contains_key(&measurement.contaminant_id) {
                tracing::warn!(
                    contaminant = %measurement.contaminant_id,
                    jurisdiction = %measurement.jurisdiction_code,
                    "dropping measurement for undefined contaminant"
                );
                continue;
            }
            measurements
                .entry(measurement.jurisdiction_code.clone())
                .or_default()
                .push(measurement);
        }

        tracing::debug!(
            jurisdictions = jurisdictions.len(),
            properties = properties.len(),
            contaminants = contaminants.len(),
            contaminant_thresholds = contaminant_thresholds.len(),
            property_thresholds = property_thresholds.len(),
            "static data source loaded"
        );

        Ok(Self {
            jurisdictions,
            properties,
            contaminants,
            contaminant_thresholds,
            property_thresholds,
            observations,
            measurements,
        })
    }

    /// Parse and index a JSON snapshot.
    pub fn from_json_str(json: &str) -> SourceResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    /// Parse and index a YAML snapshot.
    pub fn from_yaml_str(yaml: &str) -> SourceResult<Self> {
        let snapshot: Snapshot = serde_yaml::from_str(yaml)?;
        Self::from_snapshot(snapshot)
    }

    /// Load a snapshot file. `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn load(path: &Path) -> SourceResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                SourceError::Io(e)
            }
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let snapshot: Snapshot = if is_json {
            serde_json::from_str(&content).map_err(|e| SourceError::JsonParse {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| SourceError::YamlParse {
                path: path.to_path_buf(),
                source: e,
            })?
        };
        Self::from_snapshot(snapshot)
    }

    /// The jurisdiction table.
    pub fn jurisdictions(&self) -> &JurisdictionTable {
        &self.jurisdictions
    }

    /// Thresholds for legacy contaminants.
    pub fn contaminant_threshold_table(&self) -> &ThresholdTable {
        &self.contaminant_thresholds
    }

    /// Thresholds for generalized observed properties.
    pub fn property_threshold_table(&self) -> &ThresholdTable {
        &self.property_thresholds
    }
}

impl JurisdictionLookup for StaticDataSource {
    fn chain<'a>(&'a self, start: &'a JurisdictionCode, max_depth: usize) -> ChainWalk<'a> {
        self.jurisdictions.chain(start, max_depth)
    }

    fn default_code(&self) -> Option<&JurisdictionCode> {
        self.jurisdictions.default_code()
    }
}

impl SafetyDataSource for StaticDataSource {
    fn contaminant_thresholds(&self) -> &dyn ThresholdLookup {
        &self.contaminant_thresholds
    }

    fn property_thresholds(&self) -> &dyn ThresholdLookup {
        &self.property_thresholds
    }

    fn property(&self, id: &str) -> Option<&ObservedProperty> {
        self.properties.get(id)
    }

    fn contaminant(&self, id: &str) -> Option<&Contaminant> {
        self.contaminants.get(id)
    }

    fn jurisdiction(&self, code: &str) -> Option<&Jurisdiction> {
        self.jurisdictions.get(code)
    }

    fn observations_in(&self, code: &str) -> Vec<&Observation> {
        self.observations
            .get(code)
            .map(|obs| obs.iter().collect())
            .unwrap_or_default()
    }

    fn measurements_in(&self, code: &str) -> Vec<&Measurement> {
        self.measurements
            .get(code)
            .map(|m| m.iter().collect())
            .unwrap_or_default()
    }
}
