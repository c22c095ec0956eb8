//! # Status Evaluation
//!
//! Derives a [`SafetyStatus`] from a value, the entity definition and the
//! resolved threshold. There are two policies and they disagree on what a
//! missing threshold means:
//!
//! | Situation | [`ObservationPolicy`] | [`LegacyContaminantPolicy`] |
//! |-----------|-----------------------|-----------------------------|
//! | no threshold | `safe` | `danger` |
//! | `banned` / `not_approved` | evaluated by shape | `danger` |
//! | `not_controlled` / `historical` / `not_applicable` | `safe` | `safe` |
//! | null limit | `safe` | `safe` |
//! | value absent | `safe` | `safe` |
//!
//! Both policies are total. Every comparison against NaN is false, so a NaN
//! value never crosses a boundary and evaluates `safe`.

use envsafe_core::SafetyStatus;

use crate::config::{EngineConfig, DEFAULT_WARNING_RATIO};
use crate::entity::{Contaminant, ObservationType, ObservedProperty};
use crate::observation::ObservationValue;
use crate::threshold::Threshold;

/// A named evaluation entry point.
pub trait StatusPolicy {
    /// The entity definition this policy understands.
    type Entity: ?Sized;
    /// The value shape this policy understands.
    type Value: ?Sized;

    /// Derive the status. `threshold` is the output of the resolver.
    fn evaluate(
        &self,
        value: Option<&Self::Value>,
        entity: &Self::Entity,
        threshold: Option<&Threshold>,
    ) -> SafetyStatus;
}

/// Classify a number against a danger limit and an optional warning
/// boundary. Both boundaries are inclusive.
///
/// With `higher_is_bad` the value is compared with `>=`; otherwise with
/// `<=`. A `None` warning boundary makes the warning tier unreachable.
pub fn classify_numeric(
    value: f64,
    limit: f64,
    warning: Option<f64>,
    higher_is_bad: bool,
) -> SafetyStatus {
    let crosses = |boundary: f64| {
        if higher_is_bad {
            value >= boundary
        } else {
            value <= boundary
        }
    };

    if crosses(limit) {
        SafetyStatus::Danger
    } else if warning.is_some_and(crosses) {
        SafetyStatus::Warning
    } else {
        SafetyStatus::Safe
    }
}

fn is_valid_ratio(ratio: f64) -> bool {
    ratio.is_finite() && ratio > 0.0 && ratio <= 1.0
}

/// Evaluation for generalized observed properties.
///
/// A missing threshold, or one whose rule is not in force, is `safe`.
/// `banned` and `not_approved` rules are evaluated by shape like any
/// other in-force rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservationPolicy;

impl ObservationPolicy {
    fn numeric(value: f64, property: &ObservedProperty, threshold: &Threshold) -> SafetyStatus {
        let Some(limit) = threshold.limit_value.filter(|l| !l.is_nan()) else {
            return SafetyStatus::Safe;
        };
        let warning = threshold
            .warning_value
            .filter(|w| !w.is_nan())
            .or_else(|| {
                threshold
                    .warning_ratio
                    .filter(|r| is_valid_ratio(*r))
                    .map(|r| limit * r)
            });
        classify_numeric(value, limit, warning, property.higher_is_bad)
    }

    fn zone(label: &str, threshold: &Threshold) -> SafetyStatus {
        threshold
            .zone_mapping
            .as_ref()
            .and_then(|mapping| mapping.get(label))
            .copied()
            .unwrap_or(SafetyStatus::Safe)
    }

    fn incidence(rate: f64, threshold: &Threshold) -> SafetyStatus {
        if threshold
            .incidence_danger_threshold
            .is_some_and(|danger| rate >= danger)
        {
            SafetyStatus::Danger
        } else if threshold
            .incidence_warning_threshold
            .is_some_and(|warning| rate >= warning)
        {
            SafetyStatus::Warning
        } else {
            SafetyStatus::Safe
        }
    }
}

impl StatusPolicy for ObservationPolicy {
    type Entity = ObservedProperty;
    type Value = ObservationValue;

    fn evaluate(
        &self,
        value: Option<&ObservationValue>,
        property: &ObservedProperty,
        threshold: Option<&Threshold>,
    ) -> SafetyStatus {
        let Some(threshold) = threshold else {
            return SafetyStatus::Safe;
        };
        if !threshold.status.is_in_force() {
            return SafetyStatus::Safe;
        }

        // A value of the wrong shape for the declared type counts as absent.
        // Unrecognized types fall through to safe as well.
        match (property.observation_type, value) {
            (ObservationType::Numeric, Some(ObservationValue::Numeric(v))) => {
                Self::numeric(*v, property, threshold)
            }
            (ObservationType::Zone, Some(ObservationValue::Zone(label))) => {
                Self::zone(label, threshold)
            }
            (ObservationType::Endemic, Some(ObservationValue::Endemic(true))) => {
                if threshold.endemic_is_danger {
                    SafetyStatus::Danger
                } else {
                    SafetyStatus::Warning
                }
            }
            (ObservationType::Incidence, Some(ObservationValue::Incidence(rate))) => {
                Self::incidence(*rate, threshold)
            }
            (ObservationType::Binary, Some(ObservationValue::Binary(true))) => {
                if property.higher_is_bad {
                    SafetyStatus::Danger
                } else {
                    SafetyStatus::Safe
                }
            }
            _ => SafetyStatus::Safe,
        }
    }
}

/// Evaluation for legacy contaminants.
///
/// A missing threshold is `danger`. Prohibited substances are `danger`
/// regardless of value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegacyContaminantPolicy {
    default_warning_ratio: f64,
}

impl Default for LegacyContaminantPolicy {
    fn default() -> Self {
        Self {
            default_warning_ratio: DEFAULT_WARNING_RATIO,
        }
    }
}

impl LegacyContaminantPolicy {
    /// Create a policy with the given fallback warning ratio.
    ///
    /// The ratio must be in (0.0, 1.0]. Anything else, NaN included, is
    /// replaced by the default 0.8.
    pub fn new(default_warning_ratio: f64) -> Self {
        let default_warning_ratio = if is_valid_ratio(default_warning_ratio) {
            default_warning_ratio
        } else {
            tracing::warn!(
                ratio = default_warning_ratio,
                "LegacyContaminantPolicy: invalid default warning ratio, using 0.8"
            );
            DEFAULT_WARNING_RATIO
        };
        Self {
            default_warning_ratio,
        }
    }

    /// Create a policy from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.default_warning_ratio)
    }

    /// The fallback ratio applied when a threshold carries none.
    pub fn default_warning_ratio(&self) -> f64 {
        self.default_warning_ratio
    }

    /// The ratio to apply for `threshold`.
    pub fn effective_ratio(&self, threshold: &Threshold) -> f64 {
        match threshold.warning_ratio {
            None => self.default_warning_ratio,
            Some(ratio) if is_valid_ratio(ratio) => ratio,
            Some(ratio) => {
                tracing::warn!(
                    entity = %threshold.entity_id,
                    jurisdiction = %threshold.jurisdiction_code,
                    ratio,
                    fallback = self.default_warning_ratio,
                    "invalid warning ratio on threshold, using default"
                );
                self.default_warning_ratio
            }
        }
    }
}

impl StatusPolicy for LegacyContaminantPolicy {
    type Entity = Contaminant;
    type Value = f64;

    fn evaluate(
        &self,
        value: Option<&f64>,
        contaminant: &Contaminant,
        threshold: Option<&Threshold>,
    ) -> SafetyStatus {
        let Some(threshold) = threshold else {
            return SafetyStatus::Danger;
        };

        if threshold.status.is_prohibited() {
            return SafetyStatus::Danger;
        }
        if !threshold.status.is_in_force() {
            return SafetyStatus::Safe;
        }

        let Some(limit) = threshold.limit_value.filter(|l| !l.is_nan()) else {
            return SafetyStatus::Safe;
        };
        let Some(&value) = value else {
            return SafetyStatus::Safe;
        };
        let warning = limit * self.effective_ratio(threshold);
        classify_numeric(value, limit, Some(warning), contaminant.higher_is_bad)
    }
}

/// Evaluate a generalized observation with [`ObservationPolicy`].
pub fn evaluate_observation(
    value: Option<&ObservationValue>,
    property: &ObservedProperty,
    threshold: Option<&Threshold>,
) -> SafetyStatus {
    ObservationPolicy.evaluate(value, property, threshold)
}

/// Evaluate a legacy measurement with the default [`LegacyContaminantPolicy`].
pub fn evaluate_measurement(
    value: Option<f64>,
    contaminant: &Contaminant,
    threshold: Option<&Threshold>,
) -> SafetyStatus {
    LegacyContaminantPolicy::default().evaluate(value.as_ref(), contaminant, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::ThresholdStatus;
    use envsafe_core::{EntityId, JurisdictionCode, SafetyCategory};

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn us() -> JurisdictionCode {
        JurisdictionCode::new("US").unwrap()
    }

    fn lead() -> Contaminant {
        Contaminant::new(id("lead"), "Lead")
    }

    fn property(name: &str, category: SafetyCategory, ty: ObservationType) -> ObservedProperty {
        ObservedProperty::new(id(name), name, category, ty)
    }

    // -- legacy ------------------------------------------------------------

    #[test]
    fn legacy_lead_scenario() {
        let threshold = Threshold::new(id("lead"), us())
            .with_limit(15.0)
            .with_warning_ratio(0.8);
        let t = Some(&threshold);
        assert_eq!(evaluate_measurement(Some(18.0), &lead(), t), SafetyStatus::Danger);
        assert_eq!(evaluate_measurement(Some(12.0), &lead(), t), SafetyStatus::Warning);
        assert_eq!(evaluate_measurement(Some(5.0), &lead(), t), SafetyStatus::Safe);
    }

    #[test]
    fn legacy_boundaries_are_inclusive() {
        let threshold = Threshold::new(id("lead"), us()).with_limit(15.0);
        let t = Some(&threshold);
        assert_eq!(evaluate_measurement(Some(15.0), &lead(), t), SafetyStatus::Danger);
        assert_eq!(evaluate_measurement(Some(12.0), &lead(), t), SafetyStatus::Warning);
        assert_eq!(evaluate_measurement(Some(11.99), &lead(), t), SafetyStatus::Safe);
    }

    #[test]
    fn legacy_banned_is_danger_regardless_of_value() {
        let threshold = Threshold::new(id("lead"), us()).with_status(ThresholdStatus::Banned);
        for value in [None, Some(0.0), Some(1e9), Some(f64::NAN)] {
            assert_eq!(
                evaluate_measurement(value, &lead(), Some(&threshold)),
                SafetyStatus::Danger
            );
        }
        let not_approved =
            Threshold::new(id("lead"), us()).with_status(ThresholdStatus::NotApproved);
        assert_eq!(
            evaluate_measurement(Some(0.0), &lead(), Some(&not_approved)),
            SafetyStatus::Danger
        );
    }

    #[test]
    fn legacy_absent_threshold_is_danger() {
        assert_eq!(evaluate_measurement(Some(0.0), &lead(), None), SafetyStatus::Danger);
        assert_eq!(evaluate_measurement(None, &lead(), None), SafetyStatus::Danger);
    }

    #[test]
    fn legacy_uncontrolled_and_null_limit_are_safe() {
        for status in [
            ThresholdStatus::NotControlled,
            ThresholdStatus::Historical,
            ThresholdStatus::NotApplicable,
        ] {
            let t = Threshold::new(id("lead"), us())
                .with_status(status)
                .with_limit(1.0);
            assert_eq!(evaluate_measurement(Some(100.0), &lead(), Some(&t)), SafetyStatus::Safe);
        }
        let no_limit = Threshold::new(id("lead"), us());
        assert_eq!(
            evaluate_measurement(Some(100.0), &lead(), Some(&no_limit)),
            SafetyStatus::Safe
        );
        let nan_limit = Threshold::new(id("lead"), us()).with_limit(f64::NAN);
        assert_eq!(
            evaluate_measurement(Some(100.0), &lead(), Some(&nan_limit)),
            SafetyStatus::Safe
        );
    }

    #[test]
    fn legacy_missing_value_is_safe() {
        let t = Threshold::new(id("lead"), us()).with_limit(15.0);
        assert_eq!(evaluate_measurement(None, &lead(), Some(&t)), SafetyStatus::Safe);
        assert_eq!(evaluate_measurement(Some(f64::NAN), &lead(), Some(&t)), SafetyStatus::Safe);
    }

    #[test]
    fn legacy_invalid_ratio_falls_back() {
        let policy = LegacyContaminantPolicy::default();
        for bad in [f64::NAN, 0.0, -0.2, 1.5] {
            let t = Threshold::new(id("lead"), us())
                .with_limit(10.0)
                .with_warning_ratio(bad);
            assert_eq!(policy.effective_ratio(&t), DEFAULT_WARNING_RATIO);
            assert_eq!(policy.evaluate(Some(&8.0), &lead(), Some(&t)), SafetyStatus::Warning);
        }
    }

    #[test]
    fn legacy_configured_ratio() {
        let config = EngineConfig {
            default_warning_ratio: 0.5,
            ..EngineConfig::default()
        };
        let policy = LegacyContaminantPolicy::from_config(&config);
        let t = Threshold::new(id("lead"), us()).with_limit(10.0);
        assert_eq!(policy.evaluate(Some(&5.0), &lead(), Some(&t)), SafetyStatus::Warning);
        assert_eq!(policy.evaluate(Some(&4.9), &lead(), Some(&t)), SafetyStatus::Safe);
    }

    #[test]
    fn legacy_invalid_default_ratio_is_replaced() {
        assert_eq!(
            LegacyContaminantPolicy::new(f64::NAN).default_warning_ratio(),
            DEFAULT_WARNING_RATIO
        );
        assert_eq!(LegacyContaminantPolicy::new(0.9).default_warning_ratio(), 0.9);
    }

    #[test]
    fn legacy_inverted_polarity() {
        let c = lead().with_higher_is_bad(false);
        let t = Threshold::new(id("lead"), us())
            .with_limit(10.0)
            .with_warning_ratio(1.0);
        assert_eq!(evaluate_measurement(Some(10.0), &c, Some(&t)), SafetyStatus::Danger);
        assert_eq!(evaluate_measurement(Some(9.0), &c, Some(&t)), SafetyStatus::Danger);
        assert_eq!(evaluate_measurement(Some(11.0), &c, Some(&t)), SafetyStatus::Safe);
    }

    // -- generalized -------------------------------------------------------

    #[test]
    fn healthcare_access_scenario() {
        let p = property("healthcare-access", SafetyCategory::Health, ObservationType::Numeric)
            .with_higher_is_bad(false);
        let t = Threshold::new(id("healthcare-access"), us())
            .with_limit(70.0)
            .with_warning_value(85.0);
        let eval = |v: f64| evaluate_observation(Some(&ObservationValue::Numeric(v)), &p, Some(&t));
        assert_eq!(eval(65.0), SafetyStatus::Danger);
        assert_eq!(eval(70.0), SafetyStatus::Danger);
        assert_eq!(eval(80.0), SafetyStatus::Warning);
        assert_eq!(eval(85.0), SafetyStatus::Warning);
        assert_eq!(eval(95.0), SafetyStatus::Safe);
    }

    #[test]
    fn numeric_warning_falls_back_to_ratio_then_unreachable() {
        let p = property("pm25", SafetyCategory::Air, ObservationType::Numeric);
        let ratio = Threshold::new(id("pm25"), us())
            .with_limit(35.0)
            .with_warning_ratio(0.5);
        let value = ObservationValue::Numeric(20.0);
        assert_eq!(
            evaluate_observation(Some(&value), &p, Some(&ratio)),
            SafetyStatus::Warning
        );
        let bare = Threshold::new(id("pm25"), us()).with_limit(35.0);
        assert_eq!(evaluate_observation(Some(&value), &p, Some(&bare)), SafetyStatus::Safe);
        assert_eq!(
            evaluate_observation(Some(&ObservationValue::Numeric(35.0)), &p, Some(&bare)),
            SafetyStatus::Danger
        );
    }

    #[test]
    fn numeric_null_limit_is_safe() {
        let p = property("pm25", SafetyCategory::Air, ObservationType::Numeric);
        let t = Threshold::new(id("pm25"), us()).with_warning_value(10.0);
        assert_eq!(
            evaluate_observation(Some(&ObservationValue::Numeric(500.0)), &p, Some(&t)),
            SafetyStatus::Safe
        );
    }

    #[test]
    fn aqi_zone_scenario() {
        let p = property("aqi", SafetyCategory::Air, ObservationType::Zone);
        let t = Threshold::new(id("aqi"), us()).with_zone_mapping([
            ("Good", SafetyStatus::Safe),
            ("Moderate", SafetyStatus::Warning),
            ("Unhealthy", SafetyStatus::Danger),
        ]);
        let eval = |label: &str| {
            evaluate_observation(Some(&ObservationValue::Zone(label.into())), &p, Some(&t))
        };
        assert_eq!(eval("Unhealthy"), SafetyStatus::Danger);
        assert_eq!(eval("Moderate"), SafetyStatus::Warning);
        assert_eq!(eval("Unknown"), SafetyStatus::Safe);
        assert_eq!(eval("unhealthy"), SafetyStatus::Safe);

        let unmapped = Threshold::new(id("aqi"), us());
        assert_eq!(
            evaluate_observation(Some(&ObservationValue::Zone("Unhealthy".into())), &p, Some(&unmapped)),
            SafetyStatus::Safe
        );
    }

    #[test]
    fn lyme_endemic_scenario() {
        let p = property("lyme", SafetyCategory::Health, ObservationType::Endemic);
        let t = Threshold::new(id("lyme"), us());
        let eval = |v: Option<bool>, t: &Threshold| {
            evaluate_observation(v.map(ObservationValue::Endemic).as_ref(), &p, Some(t))
        };
        assert_eq!(eval(Some(true), &t), SafetyStatus::Warning);
        assert_eq!(eval(Some(false), &t), SafetyStatus::Safe);
        assert_eq!(eval(None, &t), SafetyStatus::Safe);
        let danger = t.clone().with_endemic_is_danger(true);
        assert_eq!(eval(Some(true), &danger), SafetyStatus::Danger);
    }

    #[test]
    fn incidence_tiers() {
        let p = property("tb", SafetyCategory::Health, ObservationType::Incidence);
        let t = Threshold::new(id("tb"), us()).with_incidence(Some(10.0), Some(50.0));
        let eval = |rate: f64, t: &Threshold| {
            evaluate_observation(Some(&ObservationValue::Incidence(rate)), &p, Some(t))
        };
        assert_eq!(eval(50.0, &t), SafetyStatus::Danger);
        assert_eq!(eval(10.0, &t), SafetyStatus::Warning);
        assert_eq!(eval(9.9, &t), SafetyStatus::Safe);

        let danger_only = Threshold::new(id("tb"), us()).with_incidence(None, Some(50.0));
        assert_eq!(eval(49.0, &danger_only), SafetyStatus::Safe);
        let neither = Threshold::new(id("tb"), us()).with_incidence(None, None);
        assert_eq!(eval(1e6, &neither), SafetyStatus::Safe);
        assert_eq!(evaluate_observation(None, &p, Some(&t)), SafetyStatus::Safe);
    }

    #[test]
    fn binary_has_no_warning_tier() {
        let p = property("boil-water", SafetyCategory::Water, ObservationType::Binary);
        let t = Threshold::new(id("boil-water"), us());
        let eval = |p: &ObservedProperty, v: bool| {
            evaluate_observation(Some(&ObservationValue::Binary(v)), p, Some(&t))
        };
        assert_eq!(eval(&p, true), SafetyStatus::Danger);
        assert_eq!(eval(&p, false), SafetyStatus::Safe);
        let inverted = p.clone().with_higher_is_bad(false);
        assert_eq!(eval(&inverted, true), SafetyStatus::Safe);
    }

    #[test]
    fn generalized_absent_or_inactive_threshold_is_safe() {
        let p = property("pm25", SafetyCategory::Air, ObservationType::Numeric);
        let v = ObservationValue::Numeric(1e9);
        assert_eq!(evaluate_observation(Some(&v), &p, None), SafetyStatus::Safe);
        for status in [
            ThresholdStatus::NotControlled,
            ThresholdStatus::Historical,
            ThresholdStatus::NotApplicable,
        ] {
            let t = Threshold::new(id("pm25"), us())
                .with_status(status)
                .with_limit(1.0);
            assert_eq!(evaluate_observation(Some(&v), &p, Some(&t)), SafetyStatus::Safe);
        }
    }

    #[test]
    fn generalized_banned_is_evaluated_by_shape() {
        let p = property("pesticide", SafetyCategory::Water, ObservationType::Numeric);
        let t = Threshold::new(id("pesticide"), us())
            .with_status(ThresholdStatus::Banned)
            .with_limit(1.0);
        assert_eq!(
            evaluate_observation(Some(&ObservationValue::Numeric(0.1)), &p, Some(&t)),
            SafetyStatus::Safe
        );
        assert_eq!(
            evaluate_observation(Some(&ObservationValue::Numeric(1.0)), &p, Some(&t)),
            SafetyStatus::Danger
        );
    }

    #[test]
    fn wrong_shape_is_safe() {
        let p = property("pm25", SafetyCategory::Air, ObservationType::Numeric);
        let t = Threshold::new(id("pm25"), us())
            .with_limit(1.0)
            .with_zone_mapping([("Bad", SafetyStatus::Danger)]);
        assert_eq!(
            evaluate_observation(Some(&ObservationValue::Zone("Bad".into())), &p, Some(&t)),
            SafetyStatus::Safe
        );
        assert_eq!(
            evaluate_observation(Some(&ObservationValue::Binary(true)), &p, Some(&t)),
            SafetyStatus::Safe
        );
    }

    #[test]
    fn unrecognized_type_is_safe() {
        let p = property("seismic", SafetyCategory::Disaster, ObservationType::Unrecognized);
        let t = Threshold::new(id("seismic"), us()).with_limit(0.0);
        assert_eq!(
            evaluate_observation(Some(&ObservationValue::Numeric(9.0)), &p, Some(&t)),
            SafetyStatus::Safe
        );
    }

    #[test]
    fn policies_disagree_on_absent_threshold() {
        let p = property("lead", SafetyCategory::Water, ObservationType::Numeric);
        assert_eq!(
            ObservationPolicy.evaluate(Some(&ObservationValue::Numeric(1.0)), &p, None),
            SafetyStatus::Safe
        );
        assert_eq!(
            LegacyContaminantPolicy::default().evaluate(Some(&1.0), &lead(), None),
            SafetyStatus::Danger
        );
    }

    // -- classify_numeric --------------------------------------------------

    #[test]
    fn classify_numeric_nan_is_safe() {
        assert_eq!(classify_numeric(f64::NAN, 10.0, Some(8.0), true), SafetyStatus::Safe);
        assert_eq!(classify_numeric(f64::NAN, 10.0, Some(12.0), false), SafetyStatus::Safe);
    }
}
