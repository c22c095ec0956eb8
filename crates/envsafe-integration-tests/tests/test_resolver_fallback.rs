//! # Resolver Fallback
//!
//! Tier order, termination on malformed hierarchies, and determinism of the
//! jurisdiction-chain threshold resolver.

use envsafe_core::{ChainEnd, EntityId, Jurisdiction, JurisdictionCode, JurisdictionTable};
use envsafe_engine::{
    resolve, EngineConfig, ResolutionTier, Threshold, ThresholdResolver, ThresholdTable,
};
use proptest::prelude::*;

fn id(s: &str) -> EntityId {
    EntityId::new(s).unwrap()
}

fn code(s: &str) -> JurisdictionCode {
    JurisdictionCode::new(s).unwrap()
}

fn us_chain() -> JurisdictionTable {
    JurisdictionTable::new([
        Jurisdiction::global_default(code("WHO")),
        Jurisdiction::child_of(code("US"), code("WHO")),
        Jurisdiction::child_of(code("US-NY"), code("US")),
    ])
}

fn us_and_who() -> ThresholdTable {
    [
        Threshold::new(id("x"), code("US")).with_limit(1.0),
        Threshold::new(id("x"), code("WHO")).with_limit(2.0),
    ]
    .into_iter()
    .collect()
}

// ---------------------------------------------------------------------------
// 1. Tier order
// ---------------------------------------------------------------------------

#[test]
fn nearest_ancestor_beats_default() {
    let (t, j) = (us_and_who(), us_chain());
    let found = resolve(&id("x"), &code("US-NY"), &t, &j).unwrap();
    assert_eq!(found.jurisdiction_code, code("US"));
}

#[test]
fn exact_beats_ancestor() {
    let mut t = us_and_who();
    t.insert(Threshold::new(id("x"), code("US-NY")).with_limit(0.5));
    let r = ThresholdResolver::default()
        .resolve_with_provenance(&id("x"), &code("US-NY"), &t, &us_chain())
        .unwrap();
    assert_eq!(r.tier, ResolutionTier::Exact);
    assert_eq!(r.threshold.limit_value, Some(0.5));
}

#[test]
fn default_tier_for_unlisted_jurisdiction() {
    let (t, j) = (us_and_who(), us_chain());
    let r = ThresholdResolver::default()
        .resolve_with_provenance(&id("x"), &code("BR"), &t, &j)
        .unwrap();
    assert_eq!(r.tier, ResolutionTier::Default);
    assert_eq!(r.matched_jurisdiction, code("WHO"));
}

// ---------------------------------------------------------------------------
// 2. Malformed hierarchies
// ---------------------------------------------------------------------------

#[test]
fn dangling_parent_falls_back_to_default() {
    let j = JurisdictionTable::new([
        Jurisdiction::global_default(code("WHO")),
        Jurisdiction::child_of(code("XX-1"), code("XX")),
    ]);
    assert_eq!(
        j.chain(&code("XX-1"), 4).end,
        ChainEnd::DanglingParent(code("XX"))
    );

    let t = us_and_who();
    let found = resolve(&id("x"), &code("XX-1"), &t, &j).unwrap();
    assert_eq!(found.jurisdiction_code, code("WHO"));
}

#[test]
fn dangling_parent_without_default_threshold_is_none() {
    let j = JurisdictionTable::new([Jurisdiction::child_of(code("XX-1"), code("XX"))]);
    let t = us_and_who();
    assert!(resolve(&id("x"), &code("XX-1"), &t, &j).is_none());
}

#[test]
fn self_parent_terminates() {
    let j = JurisdictionTable::new([
        Jurisdiction::global_default(code("WHO")),
        Jurisdiction::child_of(code("LOOP"), code("LOOP")),
    ]);
    let t = us_and_who();
    let found = resolve(&id("x"), &code("LOOP"), &t, &j).unwrap();
    assert_eq!(found.limit_value, Some(2.0));
    assert!(!j.validate().is_empty());
}

#[test]
fn long_chain_is_cut_at_configured_depth() {
    let j = JurisdictionTable::new([
        Jurisdiction::global_default(code("WHO")),
        Jurisdiction::child_of(code("L1"), code("WHO")),
        Jurisdiction::child_of(code("L2"), code("L1")),
        Jurisdiction::child_of(code("L3"), code("L2")),
        Jurisdiction::child_of(code("L4"), code("L3")),
        Jurisdiction::child_of(code("L5"), code("L4")),
    ]);
    let t: ThresholdTable = [
        Threshold::new(id("x"), code("L1")).with_limit(1.0),
        Threshold::new(id("x"), code("WHO")).with_limit(2.0),
    ]
    .into_iter()
    .collect();

    // L5, L4, L3, L2 are examined; L1 lies beyond the default bound.
    let r = ThresholdResolver::default()
        .resolve_with_provenance(&id("x"), &code("L5"), &t, &j)
        .unwrap();
    assert_eq!(r.tier, ResolutionTier::Default);

    let deeper = EngineConfig {
        max_chain_depth: 6,
        ..EngineConfig::default()
    };
    let r = ThresholdResolver::from_config(&deeper)
        .resolve_with_provenance(&id("x"), &code("L5"), &t, &j)
        .unwrap();
    assert_eq!(r.tier, ResolutionTier::Inherited);
    assert_eq!(r.matched_jurisdiction, code("L1"));
    assert_eq!(r.hops, 4);
}

// ---------------------------------------------------------------------------
// 3. Determinism
// ---------------------------------------------------------------------------

#[test]
fn resolution_returns_same_reference() {
    let (t, j) = (us_and_who(), us_chain());
    let a = resolve(&id("x"), &code("US-NY"), &t, &j).unwrap();
    let b = resolve(&id("x"), &code("US-NY"), &t, &j).unwrap();
    assert!(std::ptr::eq(a, b));
}

// ---------------------------------------------------------------------------
// 4. Arbitrary parent graphs
// ---------------------------------------------------------------------------

/// Up to eight jurisdictions `J0..J7`, each with an arbitrary parent among
/// `J0..J9` (so some parents dangle) or none. `J0` is the default.
fn arbitrary_table() -> impl Strategy<Value = JurisdictionTable> {
    prop::collection::vec(prop::option::of(0usize..10), 1..8).prop_map(|parents| {
        JurisdictionTable::new(parents.into_iter().enumerate().map(|(i, parent)| {
            let mut j = match parent {
                Some(p) => Jurisdiction::child_of(code(&format!("J{i}")), code(&format!("J{p}"))),
                None => Jurisdiction::root(code(&format!("J{i}"))),
            };
            j.is_default = i == 0;
            j
        }))
    })
}

proptest! {
    #[test]
    fn chain_walk_is_bounded(table in arbitrary_table(), start in 0usize..10, depth in 1usize..6) {
        let start = code(&format!("J{start}"));
        let walk = table.chain(&start, depth);
        prop_assert!(!walk.codes.is_empty());
        prop_assert!(walk.codes.len() <= depth);
        let mut seen = std::collections::HashSet::new();
        for c in &walk.codes {
            prop_assert!(seen.insert(c.as_str()), "code visited twice: {}", c);
        }
    }

    #[test]
    fn resolution_prefers_chain_over_default(table in arbitrary_table(), start in 0usize..10) {
        let start = code(&format!("J{start}"));
        let thresholds: ThresholdTable = table
            .iter()
            .map(|j| Threshold::new(id("x"), j.code.clone()))
            .collect();
        let r = ThresholdResolver::default()
            .resolve_with_provenance(&id("x"), &start, &thresholds, &table);
        if table.contains(start.as_str()) {
            // Every jurisdiction carries a threshold, so the start code wins.
            let r = r.unwrap();
            prop_assert_eq!(r.tier, ResolutionTier::Exact);
            prop_assert_eq!(&r.matched_jurisdiction, &start);
        } else if let Some(r) = r {
            prop_assert_eq!(r.tier, ResolutionTier::Default);
        }
    }
}
