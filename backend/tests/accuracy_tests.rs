//! Tests for forecast verification scoring
//! Covers the piecewise accuracy score, the snapshot/observation
//! matching window, and report summarization.

use proptest::prelude::*;
use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use shared::scoring::{accuracy_score, matches_within, summarize, MatchedPair};
use shared::types::MetricKind;

/// Helper to build a timestamp on a fixed test day
fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 6, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// A matched pair with only ensemble temperature populated
fn temp_pair(lead_hours: i32, predicted: f64, observed: f64) -> MatchedPair {
    MatchedPair {
        lead_hours,
        target_time: at(12, 0),
        observation_time: at(12, 0),
        temperature_ensemble: Some(predicted),
        precipitation_ensemble: None,
        wind_speed_ensemble: None,
        temperature_by_model: BTreeMap::new(),
        precipitation_by_model: BTreeMap::new(),
        wind_speed_by_model: BTreeMap::new(),
        observed_temperature: Some(observed),
        observed_precipitation: None,
        observed_wind_speed: None,
    }
}

fn by_model(entries: &[(&str, f64)]) -> BTreeMap<String, Option<f64>> {
    entries
        .iter()
        .map(|(model, value)| (model.to_string(), Some(*value)))
        .collect()
}

// ============================================================================
// Piecewise accuracy score (temperature tolerance is 2.0)
// ============================================================================

mod scoring {
    use super::*;

    #[test]
    fn exact_prediction_scores_100() {
        assert_eq!(accuracy_score(20.0, 20.0, 2.0), 100.0);
    }

    #[test]
    fn error_within_half_tolerance_scores_100() {
        assert_eq!(accuracy_score(20.9, 20.0, 2.0), 100.0);
        assert_eq!(accuracy_score(19.0, 20.0, 2.0), 100.0);
    }

    #[test]
    fn error_at_tolerance_scores_75() {
        assert_eq!(accuracy_score(22.0, 20.0, 2.0), 75.0);
    }

    #[test]
    fn error_at_twice_tolerance_scores_25() {
        assert_eq!(accuracy_score(24.0, 20.0, 2.0), 25.0);
    }

    #[test]
    fn huge_error_floors_at_zero() {
        assert_eq!(accuracy_score(30.0, 20.0, 2.0), 0.0);
        assert_eq!(accuracy_score(-40.0, 20.0, 2.0), 0.0);
    }

    #[test]
    fn score_is_symmetric_in_error_direction() {
        let over = accuracy_score(23.0, 20.0, 2.0);
        let under = accuracy_score(17.0, 20.0, 2.0);
        assert_eq!(over, under);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Scores are always within [0, 100].
        #[test]
        fn prop_score_in_range(
            predicted in -60.0f64..60.0,
            actual in -60.0f64..60.0,
        ) {
            for metric in [
                MetricKind::Temperature,
                MetricKind::Precipitation,
                MetricKind::WindSpeed,
            ] {
                let score = accuracy_score(predicted, actual, metric.tolerance());
                prop_assert!((0.0..=100.0).contains(&score));
            }
        }

        /// A larger absolute error never scores higher.
        #[test]
        fn prop_score_monotone_in_error(
            actual in -30.0f64..30.0,
            error in 0.0f64..15.0,
            extra in 0.001f64..5.0,
        ) {
            let near = accuracy_score(actual + error, actual, 2.0);
            let far = accuracy_score(actual + error + extra, actual, 2.0);
            prop_assert!(far <= near + 1e-9);
        }
    }
}

// ============================================================================
// Matching window
// ============================================================================

mod matching {
    use super::*;

    #[test]
    fn observation_within_tolerance_matches() {
        let tolerance = Duration::hours(1);
        assert!(matches_within(at(12, 0), at(12, 30), tolerance));
        assert!(matches_within(at(12, 0), at(11, 30), tolerance));
    }

    #[test]
    fn observation_outside_tolerance_does_not_match() {
        let tolerance = Duration::hours(1);
        assert!(!matches_within(at(12, 0), at(14, 0), tolerance));
        assert!(!matches_within(at(12, 0), at(10, 0), tolerance));
    }

    #[test]
    fn window_boundary_is_exclusive() {
        // Exactly one hour apart is outside a one hour window
        let tolerance = Duration::hours(1);
        assert!(!matches_within(at(12, 0), at(13, 0), tolerance));
        assert!(matches_within(at(12, 0), at(12, 59), tolerance));
    }
}

// ============================================================================
// Report summarization
// ============================================================================

mod summarization {
    use super::*;

    #[test]
    fn empty_pairs_yield_defined_empty_report() {
        let report = summarize(&[], 30);
        assert_eq!(report.period, "30_days");
        assert_eq!(report.ensemble_accuracy, 0.0);
        assert!(report.by_lead_time.is_empty());
        assert!(report.model_performance.is_empty());
    }

    #[test]
    fn perfect_forecast_scores_100_overall() {
        let mut pair = temp_pair(24, 20.0, 20.0);
        pair.precipitation_ensemble = Some(0.0);
        pair.observed_precipitation = Some(0.0);
        pair.wind_speed_ensemble = Some(12.0);
        pair.observed_wind_speed = Some(12.0);

        let report = summarize(&[pair], 30);
        assert_eq!(report.ensemble_accuracy, 100.0);
    }

    #[test]
    fn missing_precipitation_defaults_to_full_score() {
        // Temperature off by one tolerance scores 75; absent
        // precipitation and wind contribute 100 each.
        let pair = temp_pair(24, 22.0, 20.0);

        let report = summarize(&[pair], 30);
        // (75 + 100 + 100) / 3 ≈ 91.7
        assert_eq!(report.ensemble_accuracy, 91.7);
    }

    #[test]
    fn pair_without_observed_temperature_is_skipped() {
        let mut pair = temp_pair(24, 20.0, 20.0);
        pair.observed_temperature = None;

        let report = summarize(&[pair], 30);
        assert_eq!(report.ensemble_accuracy, 0.0);
        assert!(report.by_lead_time.is_empty());
    }

    #[test]
    fn scores_group_by_lead_time() {
        let pairs = vec![
            temp_pair(24, 20.0, 20.0),
            temp_pair(24, 20.0, 20.0),
            temp_pair(72, 24.0, 20.0),
        ];

        let report = summarize(&pairs, 30);
        // Perfect pairs at 24h, a 25-scoring temperature at 72h
        assert_eq!(report.by_lead_time.get("24h"), Some(&100.0));
        assert_eq!(report.by_lead_time.get("72h"), Some(&75.0));
    }

    #[test]
    fn models_rank_by_overall_accuracy() {
        let mut pair = temp_pair(24, 20.0, 20.0);
        pair.temperature_by_model = by_model(&[("sharp", 20.0), ("blunt", 24.0)]);
        pair.precipitation_by_model = by_model(&[("sharp", 0.0), ("blunt", 0.0)]);
        pair.observed_precipitation = Some(0.0);

        let report = summarize(&[pair], 30);
        assert_eq!(report.model_performance.len(), 2);
        assert_eq!(report.model_performance[0].model_name, "sharp");
        assert_eq!(report.model_performance[0].overall_accuracy, 100.0);
        assert_eq!(report.model_performance[1].model_name, "blunt");
        // Temperature 25, precipitation 100
        assert_eq!(report.model_performance[1].overall_accuracy, 62.5);
    }

    #[test]
    fn model_sample_count_counts_temperature_comparisons() {
        let mut first = temp_pair(24, 20.0, 20.0);
        first.temperature_by_model = by_model(&[("gfs", 20.5)]);
        let mut second = temp_pair(48, 21.0, 20.0);
        second.temperature_by_model = by_model(&[("gfs", 19.5)]);

        let report = summarize(&[first, second], 30);
        assert_eq!(report.model_performance[0].sample_count, 2);
    }

    #[test]
    fn model_without_precipitation_data_defaults_to_100() {
        let mut pair = temp_pair(24, 20.0, 20.0);
        pair.temperature_by_model = by_model(&[("gfs", 20.0)]);

        let report = summarize(&[pair], 30);
        assert_eq!(report.model_performance[0].precipitation_accuracy, 100.0);
        assert_eq!(report.model_performance[0].overall_accuracy, 100.0);
    }

    #[test]
    fn summarize_is_deterministic() {
        let mut pair = temp_pair(24, 21.4, 20.0);
        pair.temperature_by_model = by_model(&[("a", 21.0), ("b", 23.0)]);

        let first = summarize(&[pair.clone()], 14);
        let second = summarize(&[pair], 14);
        assert_eq!(first.ensemble_accuracy, second.ensemble_accuracy);
        assert_eq!(first.by_lead_time, second.by_lead_time);
        assert_eq!(
            first.model_performance.len(),
            second.model_performance.len()
        );
    }
}
