//! # Threshold Resolver
//!
//! Picks the threshold that applies to an entity at a jurisdiction. Three
//! tiers are tried strictly in order:
//!
//! ```text
//! 1. exact      (entity, code)
//! 2. inherited  (entity, parent), (entity, grandparent), ...
//! 3. default    (entity, default jurisdiction)   attempted once
//! ```
//!
//! The parent walk is an explicit bounded loop over
//! [`JurisdictionLookup::chain`]. A dangling parent ends the chain quietly;
//! a cycle or a chain deeper than `max_chain_depth` ends it with a warning.
//! Either way the default tier is still tried. Finding nothing is not an
//! error: the caller's evaluation policy decides what "no threshold" means.

use serde::Serialize;

use envsafe_core::{ChainEnd, ChainWalk, EntityId, JurisdictionCode, JurisdictionTable};

use crate::config::EngineConfig;
use crate::threshold::{Threshold, ThresholdLookup};

/// Read access to the jurisdiction hierarchy.
pub trait JurisdictionLookup {
    /// Walk the parent chain from `start`, examining at most `max_depth`
    /// codes. The starting code is always first.
    fn chain<'a>(&'a self, start: &'a JurisdictionCode, max_depth: usize) -> ChainWalk<'a>;

    /// The jurisdiction flagged as the global default, if any.
    fn default_code(&self) -> Option<&JurisdictionCode>;
}

impl JurisdictionLookup for JurisdictionTable {
    fn chain<'a>(&'a self, start: &'a JurisdictionCode, max_depth: usize) -> ChainWalk<'a> {
        JurisdictionTable::chain(self, start, max_depth)
    }

    fn default_code(&self) -> Option<&JurisdictionCode> {
        JurisdictionTable::default_code(self)
    }
}

/// Which resolver tier produced a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    /// The location's own jurisdiction.
    Exact,
    /// An ancestor in the parent chain.
    Inherited,
    /// The global default jurisdiction.
    Default,
}

/// A resolved threshold and how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'t> {
    pub threshold: &'t Threshold,
    pub tier: ResolutionTier,
    /// Jurisdiction whose record matched.
    pub matched_jurisdiction: JurisdictionCode,
    /// Parent links followed before the match. For the default tier, the
    /// number of chain codes examined first.
    pub hops: usize,
}

/// Resolves thresholds through the jurisdiction fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdResolver {
    max_chain_depth: usize,
    default_override: Option<JurisdictionCode>,
}

impl Default for ThresholdResolver {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ThresholdResolver {
    /// Build a resolver from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_chain_depth: config.max_chain_depth.max(1),
            default_override: config.default_jurisdiction.clone(),
        }
    }

    /// Resolve the threshold for `entity_id` at `jurisdiction`.
    pub fn resolve<'t, T, J>(
        &self,
        entity_id: &EntityId,
        jurisdiction: &JurisdictionCode,
        thresholds: &'t T,
        jurisdictions: &J,
    ) -> Option<&'t Threshold>
    where
        T: ThresholdLookup + ?Sized,
        J: JurisdictionLookup + ?Sized,
    {
        self.resolve_with_provenance(entity_id, jurisdiction, thresholds, jurisdictions)
            .map(|r| r.threshold)
    }

    /// Resolve and report which tier matched.
    pub fn resolve_with_provenance<'t, T, J>(
        &self,
        entity_id: &EntityId,
        jurisdiction: &JurisdictionCode,
        thresholds: &'t T,
        jurisdictions: &J,
    ) -> Option<Resolution<'t>>
    where
        T: ThresholdLookup + ?Sized,
        J: JurisdictionLookup + ?Sized,
    {
        let walk = jurisdictions.chain(jurisdiction, self.max_chain_depth);

        for (hops, candidate) in walk.codes.iter().enumerate() {
            if let Some(threshold) = thresholds.threshold(entity_id.as_str(), candidate.as_str()) {
                let tier = if hops == 0 {
                    ResolutionTier::Exact
                } else {
                    ResolutionTier::Inherited
                };
                tracing::debug!(
                    entity = %entity_id,
                    jurisdiction = %jurisdiction,
                    matched = %candidate,
                    hops,
                    ?tier,
                    "threshold resolved"
                );
                return Some(Resolution {
                    threshold,
                    tier,
                    matched_jurisdiction: (*candidate).clone(),
                    hops,
                });
            }
        }

        if walk.end.is_abnormal() {
            tracing::warn!(
                jurisdiction = %jurisdiction,
                end = ?walk.end,
                max_depth = self.max_chain_depth,
                "jurisdiction chain cut short, falling back to default"
            );
        } else if let ChainEnd::DanglingParent(parent) = &walk.end {
            tracing::debug!(
                jurisdiction = %jurisdiction,
                parent = %parent,
                "dangling parent jurisdiction treated as root"
            );
        }

        let default_code = self
            .default_override
            .as_ref()
            .or_else(|| jurisdictions.default_code())?;
        let threshold = thresholds.threshold(entity_id.as_str(), default_code.as_str())?;
        tracing::debug!(
            entity = %entity_id,
            jurisdiction = %jurisdiction,
            matched = %default_code,
            "threshold resolved from default jurisdiction"
        );
        Some(Resolution {
            threshold,
            tier: ResolutionTier::Default,
            matched_jurisdiction: default_code.clone(),
            hops: walk.codes.len(),
        })
    }
}

/// Resolve with the default resolver configuration.
pub fn resolve<'t, T, J>(
    entity_id: &EntityId,
    jurisdiction: &JurisdictionCode,
    thresholds: &'t T,
    jurisdictions: &J,
) -> Option<&'t Threshold>
where
    T: ThresholdLookup + ?Sized,
    J: JurisdictionLookup + ?Sized,
{
    ThresholdResolver::default().resolve(entity_id, jurisdiction, thresholds, jurisdictions)
}
