//! Tests for ensemble aggregation
//! Verifies weighted averaging, confidence scoring and weather code
//! resolution across models.

use proptest::prelude::*;
use std::collections::BTreeMap;

use shared::ensemble::{
    confidence_score, resolve_weather_code, round_to, weighted_average, WeightTable,
};
use shared::types::MetricKind;

/// Helper to build a per-model value map
fn values(entries: &[(&str, Option<f64>)]) -> BTreeMap<String, Option<f64>> {
    entries
        .iter()
        .map(|(model, value)| (model.to_string(), *value))
        .collect()
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// Weighted averaging
// ============================================================================

mod weighted_averaging {
    use super::*;

    #[test]
    fn equal_weights_reduce_to_arithmetic_mean() {
        let input = values(&[("a", Some(18.0)), ("b", Some(20.0)), ("c", Some(22.0))]);
        let weights = WeightTable::new();

        let result = weighted_average(&input, &weights);
        assert!(approx_eq(result.mean, 20.0));
    }

    #[test]
    fn higher_weight_pulls_mean_toward_model() {
        let input = values(&[("heavy", Some(30.0)), ("light", Some(10.0))]);
        let mut weights = WeightTable::new();
        weights.insert("heavy".to_string(), 3.0);
        weights.insert("light".to_string(), 1.0);

        // (30*3 + 10*1) / 4 = 25
        let result = weighted_average(&input, &weights);
        assert!(approx_eq(result.mean, 25.0));
    }

    #[test]
    fn missing_values_are_excluded_not_zero() {
        let input = values(&[("a", Some(20.0)), ("b", None), ("c", Some(22.0))]);
        let weights = WeightTable::new();

        let result = weighted_average(&input, &weights);
        assert!(approx_eq(result.mean, 21.0));
    }

    #[test]
    fn all_absent_yields_zero_result() {
        let input = values(&[("a", None), ("b", None)]);
        let weights = WeightTable::new();

        let result = weighted_average(&input, &weights);
        assert_eq!(result.mean, 0.0);
        assert_eq!(result.spread, 0.0);
    }

    #[test]
    fn spread_is_population_standard_deviation() {
        // std([18, 20, 22]) with population normalization = sqrt(8/3)
        let input = values(&[("a", Some(18.0)), ("b", Some(20.0)), ("c", Some(22.0))]);
        let weights = WeightTable::new();

        let result = weighted_average(&input, &weights);
        assert!((result.spread - (8.0f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn spread_ignores_weights() {
        let input = values(&[("a", Some(10.0)), ("b", Some(20.0))]);
        let mut weights = WeightTable::new();
        weights.insert("a".to_string(), 5.0);

        let unweighted = weighted_average(&input, &WeightTable::new());
        let weighted = weighted_average(&input, &weights);
        assert!(approx_eq(unweighted.spread, weighted.spread));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The weighted mean is bounded by the min and max input values.
        #[test]
        fn prop_mean_bounded_by_inputs(
            vals in prop::collection::vec(-50.0f64..50.0, 1..6),
            weights_raw in prop::collection::vec(0.1f64..5.0, 6),
        ) {
            let input: BTreeMap<String, Option<f64>> = vals
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("model_{}", i), Some(*v)))
                .collect();
            let weights: WeightTable = weights_raw
                .iter()
                .enumerate()
                .map(|(i, w)| (format!("model_{}", i), *w))
                .collect();

            let result = weighted_average(&input, &weights);

            let min = vals.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(result.mean >= min - 1e-9);
            prop_assert!(result.mean <= max + 1e-9);
        }

        /// Scaling every weight by the same factor leaves the mean
        /// unchanged, since weights are normalized over present models.
        #[test]
        fn prop_weight_scale_invariance(
            vals in prop::collection::vec(-50.0f64..50.0, 2..6),
            scale in 0.5f64..10.0,
        ) {
            let input: BTreeMap<String, Option<f64>> = vals
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("model_{}", i), Some(*v)))
                .collect();
            let weights: WeightTable = input
                .keys()
                .enumerate()
                .map(|(i, model)| (model.clone(), 1.0 + i as f64 * 0.3))
                .collect();
            let scaled: WeightTable = weights
                .iter()
                .map(|(model, w)| (model.clone(), w * scale))
                .collect();

            let base = weighted_average(&input, &weights);
            let rescaled = weighted_average(&input, &scaled);
            prop_assert!((base.mean - rescaled.mean).abs() < 1e-6);
        }
    }
}

// ============================================================================
// Confidence scoring
// ============================================================================

mod confidence {
    use super::*;

    #[test]
    fn zero_spread_is_full_confidence() {
        assert!(approx_eq(confidence_score(0.0, MetricKind::Temperature), 100.0));
        assert!(approx_eq(confidence_score(0.0, MetricKind::Precipitation), 100.0));
        assert!(approx_eq(confidence_score(0.0, MetricKind::WindSpeed), 100.0));
    }

    #[test]
    fn one_typical_spread_decays_to_e_inverse() {
        // 100 * exp(-1) ≈ 36.79
        let confidence = confidence_score(3.0, MetricKind::Temperature);
        assert!((confidence - 100.0 * (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn temperature_example_from_three_models() {
        // spread of [18, 20, 22] is sqrt(8/3) ≈ 1.633
        let spread = (8.0f64 / 3.0).sqrt();
        let confidence = confidence_score(spread, MetricKind::Temperature);
        assert!((confidence - 58.0).abs() < 2.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Confidence is always within [0, 100].
        #[test]
        fn prop_confidence_in_range(spread in 0.0f64..1000.0) {
            for metric in [
                MetricKind::Temperature,
                MetricKind::Precipitation,
                MetricKind::WindSpeed,
            ] {
                let confidence = confidence_score(spread, metric);
                prop_assert!((0.0..=100.0).contains(&confidence));
            }
        }

        /// More disagreement never increases confidence.
        #[test]
        fn prop_confidence_monotonically_decreasing(
            spread in 0.0f64..100.0,
            delta in 0.001f64..50.0,
        ) {
            let lower = confidence_score(spread + delta, MetricKind::WindSpeed);
            let higher = confidence_score(spread, MetricKind::WindSpeed);
            prop_assert!(lower <= higher + 1e-9);
        }
    }
}

// ============================================================================
// Weather code resolution
// ============================================================================

mod weather_codes {
    use super::*;

    #[test]
    fn majority_code_wins() {
        let input = values(&[
            ("a", Some(61.0)),
            ("b", Some(61.0)),
            ("c", Some(95.0)),
        ]);
        assert_eq!(resolve_weather_code(&input), 61);
    }

    #[test]
    fn tie_resolves_to_more_severe_code() {
        let input = values(&[("a", Some(61.0)), ("b", Some(95.0))]);
        assert_eq!(resolve_weather_code(&input), 95);
    }

    #[test]
    fn absent_values_do_not_vote() {
        let input = values(&[("a", Some(3.0)), ("b", None), ("c", None)]);
        assert_eq!(resolve_weather_code(&input), 3);
    }

    #[test]
    fn no_codes_yields_clear_sky() {
        let input = values(&[("a", None)]);
        assert_eq!(resolve_weather_code(&input), 0);
        assert_eq!(resolve_weather_code(&BTreeMap::new()), 0);
    }
}

// ============================================================================
// Rounding
// ============================================================================

#[test]
fn round_to_matches_reported_precision() {
    assert!(approx_eq(round_to(21.349, 1), 21.3));
    assert!(approx_eq(round_to(21.36, 1), 21.4));
    assert!(approx_eq(round_to(87.5, 0), 88.0));
    assert!(approx_eq(round_to(1.2345, 2), 1.23));
}
