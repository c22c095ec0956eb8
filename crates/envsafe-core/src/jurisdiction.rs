//! # Jurisdiction Records & Parent Chains
//!
//! A [`Jurisdiction`] is a regulatory region with an optional parent. The
//! parent pointers form the fallback chain the threshold resolver walks:
//!
//! ```text
//! US-NY-NYC ──▶ US-NY ──▶ US ──▶ WHO (default, no parent)
//! ```
//!
//! Jurisdiction data is entered by administrators and is not trusted to be
//! well formed. [`JurisdictionTable::chain`] is an explicit bounded loop
//! with a visited set: a dangling parent ends the chain, a cycle ends the
//! chain, and the walk never examines more than `max_depth` codes.
//! [`JurisdictionTable::validate`] reports the same defects for
//! administrators without failing.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::JurisdictionCode;

/// Maximum number of jurisdictions examined in one chain walk:
/// sub-region → state/province → country → global.
pub const MAX_CHAIN_DEPTH: usize = 4;

/// A regulatory region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jurisdiction {
    /// Unique code, e.g. `"US-NY"`.
    pub code: JurisdictionCode,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Next jurisdiction up the fallback chain. Empty strings from the
    /// upstream store deserialize as `None`.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_code: Option<JurisdictionCode>,
    /// Whether this is the global fallback jurisdiction.
    #[serde(default)]
    pub is_default: bool,
}

impl Jurisdiction {
    /// A jurisdiction with no parent that is not the default.
    pub fn root(code: JurisdictionCode) -> Self {
        Self {
            code,
            name: None,
            parent_code: None,
            is_default: false,
        }
    }

    /// A jurisdiction whose parent is `parent`.
    pub fn child_of(code: JurisdictionCode, parent: JurisdictionCode) -> Self {
        Self {
            code,
            name: None,
            parent_code: Some(parent),
            is_default: false,
        }
    }

    /// The global default jurisdiction.
    pub fn global_default(code: JurisdictionCode) -> Self {
        Self {
            code,
            name: None,
            parent_code: None,
            is_default: true,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

fn deserialize_optional_code<'de, D>(deserializer: D) -> Result<Option<JurisdictionCode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| JurisdictionCode::new(s).ok()))
}

/// Why a chain walk stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEnd {
    /// The last jurisdiction has no parent.
    Root,
    /// The starting code is not in the table, so its parent is unknown.
    UnknownJurisdiction,
    /// The last jurisdiction names a parent that is not in the table.
    DanglingParent(JurisdictionCode),
    /// The named parent was already visited.
    Cycle(JurisdictionCode),
    /// `max_depth` codes were examined and a further parent exists.
    DepthLimit,
}

impl ChainEnd {
    /// `true` when the walk stopped because the data is malformed or too deep.
    pub fn is_abnormal(&self) -> bool {
        matches!(self, Self::Cycle(_) | Self::DepthLimit)
    }
}

/// The result of walking a parent chain: the codes visited in order
/// (starting code first) and the reason the walk stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainWalk<'a> {
    /// Codes examined, most specific first.
    pub codes: Vec<&'a JurisdictionCode>,
    /// Why the walk stopped.
    pub end: ChainEnd,
}

/// In-memory jurisdiction table keyed by code.
///
/// Construction never fails; defects are surfaced by [`validate`](Self::validate).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JurisdictionTable {
    records: BTreeMap<JurisdictionCode, Jurisdiction>,
    default_code: Option<JurisdictionCode>,
}

impl JurisdictionTable {
    /// Build a table from records.
    ///
    /// A later record with a duplicate code replaces the earlier one. When
    /// several records are flagged default, the lexicographically smallest
    /// code is chosen so the outcome does not depend on input order.
    pub fn new(records: impl IntoIterator<Item = Jurisdiction>) -> Self {
        let mut map = BTreeMap::new();
        for record in records {
            if let Some(previous) = map.insert(record.code.clone(), record) {
                tracing::warn!(code = %previous.code, "duplicate jurisdiction code, keeping the later record");
            }
        }

        let defaults: Vec<&JurisdictionCode> = map
            .values()
            .filter(|j| j.is_default)
            .map(|j| &j.code)
            .collect();
        if defaults.len() > 1 {
            tracing::warn!(
                count = defaults.len(),
                chosen = %defaults[0],
                "multiple default jurisdictions flagged"
            );
        }
        let default_code = defaults.first().map(|c| (*c).clone());

        Self {
            records: map,
            default_code,
        }
    }

    /// Look up a jurisdiction by code.
    pub fn get(&self, code: &str) -> Option<&Jurisdiction> {
        self.records.get(code)
    }

    /// Whether a code is present.
    pub fn contains(&self, code: &str) -> bool {
        self.records.contains_key(code)
    }

    /// The code of the jurisdiction flagged default, if any.
    pub fn default_code(&self) -> Option<&JurisdictionCode> {
        self.default_code.as_ref()
    }

    /// Number of jurisdictions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Jurisdiction> {
        self.records.values()
    }

    /// Walk the parent chain starting at `start`.
    ///
    /// The starting code is always the first element, whether or not it is
    /// in the table. A dangling parent is treated as "no parent". At most
    /// `max_depth` codes are returned (a `max_depth` of zero is treated as
    /// one, so the starting code is always examined).
    pub fn chain<'a>(&'a self, start: &'a JurisdictionCode, max_depth: usize) -> ChainWalk<'a> {
        let max_depth = max_depth.max(1);
        let mut codes = vec![start];
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(start.as_str());

        let Some(mut current) = self.records.get(start) else {
            return ChainWalk {
                codes,
                end: ChainEnd::UnknownJurisdiction,
            };
        };

        loop {
            let Some(parent) = current.parent_code.as_ref() else {
                return ChainWalk {
                    codes,
                    end: ChainEnd::Root,
                };
            };
            if visited.contains(parent.as_str()) {
                return ChainWalk {
                    codes,
                    end: ChainEnd::Cycle(parent.clone()),
                };
            }
            let Some(next) = self.records.get(parent) else {
                return ChainWalk {
                    codes,
                    end: ChainEnd::DanglingParent(parent.clone()),
                };
            };
            if codes.len() >= max_depth {
                return ChainWalk {
                    codes,
                    end: ChainEnd::DepthLimit,
                };
            }
            visited.insert(next.code.as_str());
            codes.push(&next.code);
            current = next;
        }
    }

    /// Validate the table. Returns a list of problems (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let defaults: Vec<&Jurisdiction> = self.records.values().filter(|j| j.is_default).collect();
        match defaults.len() {
            0 => errors.push("no default jurisdiction is flagged".to_string()),
            1 => {}
            n => errors.push(format!(
                "{n} jurisdictions are flagged default: {}",
                defaults
                    .iter()
                    .map(|j| j.code.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
        for d in &defaults {
            if let Some(parent) = &d.parent_code {
                errors.push(format!(
                    "default jurisdiction {} must not have a parent (has {parent})",
                    d.code
                ));
            }
        }

        // Walking with a bound larger than the table always terminates by
        // root, dangling parent or cycle.
        let unbounded = self.records.len() + 1;
        for record in self.records.values() {
            if let Some(parent) = &record.parent_code {
                if parent == &record.code {
                    errors.push(format!("jurisdiction {} is its own parent", record.code));
                    continue;
                }
            }
            let walk = self.chain(&record.code, unbounded);
            match &walk.end {
                ChainEnd::DanglingParent(parent) if walk.codes.len() == 1 => {
                    errors.push(format!(
                        "jurisdiction {} references unknown parent {parent}",
                        record.code
                    ));
                }
                ChainEnd::Cycle(back_to) if back_to == &record.code => {
                    errors.push(format!(
                        "jurisdiction {} is part of a parent cycle",
                        record.code
                    ));
                }
                _ => {}
            }
            if walk.codes.len() > MAX_CHAIN_DEPTH {
                errors.push(format!(
                    "jurisdiction {} has a chain of {} levels, deeper than {MAX_CHAIN_DEPTH}",
                    record.code,
                    walk.codes.len()
                ));
            }
        }

        errors
    }
}

impl FromIterator<Jurisdiction> for JurisdictionTable {
    fn from_iter<I: IntoIterator<Item = Jurisdiction>>(iter: I) -> Self {
        Self::new(iter)
    }
}
