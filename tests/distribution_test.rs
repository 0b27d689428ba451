//! Integration tests for hourly ad distribution

use adsky::distribution::{AdDistributor, DistributionError, DEFAULT_FORMULA};
use adsky::expression::{Bindings, ExpressionEvaluator, ExpressionResult};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

// ============================================================================
// Rounding
// ============================================================================

#[test]
fn test_exact_integer_is_kept() {
    let d = AdDistributor::with_defaults();
    assert_eq!(d.compute_ads_for_hour("3.0", 12, 0, 1).unwrap(), 3);
}

#[test]
fn test_fraction_rounds_up() {
    let d = AdDistributor::with_defaults();
    assert_eq!(d.compute_ads_for_hour("3.01", 12, 0, 1).unwrap(), 4);
    assert_eq!(d.compute_ads_for_hour("0.1", 12, 0, 1).unwrap(), 1);
}

#[test]
fn test_negative_fraction_is_zero() {
    let d = AdDistributor::with_defaults();
    assert_eq!(d.compute_ads_for_hour("-0.5", 12, 0, 1).unwrap(), 0);
}

// ============================================================================
// Default curve
// ============================================================================

#[test]
fn test_symmetry_h12_k3_n100() {
    let d = AdDistributor::with_defaults();
    assert_eq!(
        d.compute_ads_for_hour(DEFAULT_FORMULA, 12, 15, 100).unwrap(),
        d.compute_ads_for_hour(DEFAULT_FORMULA, 12, 9, 100).unwrap()
    );
}

#[test]
fn test_peak_at_preferred_hour() {
    let d = AdDistributor::with_defaults();
    for preferred in [0, 6, 12, 18, 23] {
        let day = d.daily_distribution(DEFAULT_FORMULA, preferred, 50).unwrap();
        assert_eq!(
            day.count_at(preferred),
            Some(day.max_count()),
            "peak should be at {preferred}"
        );
    }
}

#[test]
fn test_small_pool_concentrates_near_peak() {
    // n = 5: far hours go negative and are clamped
    let day = AdDistributor::with_defaults()
        .daily_distribution(DEFAULT_FORMULA, 12, 5)
        .unwrap();
    assert_eq!(day.count_at(0), Some(0));
    assert_eq!(day.count_at(12), Some(2));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_malformed_formula_reports_text() {
    let formula = "((x - h) * 2";
    let err = AdDistributor::with_defaults()
        .compute_ads_for_hour(formula, 12, 12, 10)
        .unwrap_err();
    assert!(matches!(err, DistributionError::Formula { .. }));
    assert_eq!(err.formula(), formula);
    assert!(err.to_string().contains(formula));
}

#[test]
fn test_deeply_nested_formula_is_formula_error() {
    let distributor = AdDistributor::with_defaults();
    for depth in [3_000, 20_000, 200_000] {
        let formula = "(".repeat(depth);
        let err = distributor
            .compute_ads_for_hour(&formula, 12, 12, 10)
            .unwrap_err();
        assert!(matches!(err, DistributionError::Formula { .. }));
    }
}

#[test]
fn test_zero_ads_is_domain_error() {
    let err = AdDistributor::with_defaults()
        .compute_ads_for_hour(DEFAULT_FORMULA, 12, 12, 0)
        .unwrap_err();
    assert!(matches!(err, DistributionError::Domain { .. }));
}

// ============================================================================
// Injected evaluator
// ============================================================================

struct FixedEvaluator(Decimal);

impl ExpressionEvaluator for FixedEvaluator {
    fn evaluate(&self, _formula: &str, bindings: &Bindings) -> ExpressionResult<Decimal> {
        assert!(bindings.get("h").is_some());
        assert!(bindings.get("x").is_some());
        assert!(bindings.get("n").is_some());
        Ok(self.0)
    }
}

#[test]
fn test_custom_evaluator_is_used() {
    let d = AdDistributor::new(FixedEvaluator(Decimal::new(71, 1)));
    assert_eq!(d.compute_ads_for_hour("ignored", 1, 2, 3).unwrap(), 8);
}

#[test]
fn test_shared_across_threads() {
    let d = Arc::new(AdDistributor::with_defaults());
    let handles: Vec<_> = (0..24)
        .map(|hour| {
            let d = Arc::clone(&d);
            std::thread::spawn(move || d.compute_ads_for_hour(DEFAULT_FORMULA, 12, hour, 100))
        })
        .collect();

    let counts: Vec<u32> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    let sequential = AdDistributor::with_defaults()
        .daily_distribution(DEFAULT_FORMULA, 12, 100)
        .unwrap();
    assert_eq!(counts, sequential.counts);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_default_formula_symmetric(h in 0u32..24, k in 0u32..12, n in 1u32..10_000) {
        prop_assume!(k <= h);
        let d = AdDistributor::with_defaults();
        let later = d.compute_ads_for_hour(DEFAULT_FORMULA, h, h + k, n).unwrap();
        let earlier = d.compute_ads_for_hour(DEFAULT_FORMULA, h, h - k, n).unwrap();
        prop_assert_eq!(later, earlier);
    }

    #[test]
    fn prop_default_formula_never_fails(h in 0u32..24, x in 0u32..24, n in 1u32..100_000) {
        let d = AdDistributor::with_defaults();
        prop_assert!(d.compute_ads_for_hour(DEFAULT_FORMULA, h, x, n).is_ok());
    }

    #[test]
    fn prop_peak_is_maximal(h in 0u32..24, n in 1u32..10_000) {
        let day = AdDistributor::with_defaults()
            .daily_distribution(DEFAULT_FORMULA, h, n)
            .unwrap();
        prop_assert_eq!(day.count_at(h), Some(day.max_count()));
    }
}
