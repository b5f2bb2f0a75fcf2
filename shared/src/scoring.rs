//! Forecast verification scoring
//!
//! Pure scoring and summarization over matched snapshot/observation
//! pairs. The database join produces the candidate pairs; everything
//! here is side-effect-free and deterministic.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};

use crate::ensemble::round_to;
use crate::models::accuracy::{AccuracyReport, ModelAccuracy};
use crate::types::MetricKind;

/// One forecast snapshot joined to one observation for the same
/// location within the matching tolerance.
#[derive(Debug, Clone)]
pub struct MatchedPair {
    pub lead_hours: i32,
    pub target_time: NaiveDateTime,
    pub observation_time: NaiveDateTime,
    pub temperature_ensemble: Option<f64>,
    pub precipitation_ensemble: Option<f64>,
    pub wind_speed_ensemble: Option<f64>,
    pub temperature_by_model: BTreeMap<String, Option<f64>>,
    pub precipitation_by_model: BTreeMap<String, Option<f64>>,
    pub wind_speed_by_model: BTreeMap<String, Option<f64>>,
    pub observed_temperature: Option<f64>,
    pub observed_precipitation: Option<f64>,
    pub observed_wind_speed: Option<f64>,
}

/// Matching contract between a forecast target time and an observation
/// time: the pair matches iff the absolute difference is strictly
/// inside the tolerance window.
pub fn matches_within(
    target_time: NaiveDateTime,
    observation_time: NaiveDateTime,
    tolerance: Duration,
) -> bool {
    (target_time - observation_time).abs() < tolerance
}

/// Accuracy score (0-100) for one predicted/observed value.
///
/// Piecewise in the absolute error, for temperature (tolerance 2°C):
/// error ≤ 1°C scores 100, 1-2°C decays 100→75, 2-4°C decays 75→25,
/// beyond 4°C decays 25→0 with a floor at 0. Small errors are forgiven
/// completely while large ones are penalized hard.
pub fn accuracy_score(predicted: f64, actual: f64, tolerance: f64) -> f64 {
    let error = (predicted - actual).abs();

    if error <= tolerance * 0.5 {
        100.0
    } else if error <= tolerance {
        100.0 - (error / tolerance) * 25.0
    } else if error <= tolerance * 2.0 {
        75.0 - ((error - tolerance) / tolerance) * 50.0
    } else {
        (25.0 - ((error - tolerance * 2.0) / tolerance) * 25.0).max(0.0)
    }
}

/// Summarize matched pairs into an accuracy report.
///
/// The per-pair ensemble score requires both a predicted and an
/// observed temperature; precipitation and wind default to 100 when
/// either side is absent. Missing precipitation data means "no error",
/// not a penalty - changing that would break comparability with
/// historical reports.
pub fn summarize(pairs: &[MatchedPair], days: i64) -> AccuracyReport {
    let period = format!("{}_days", days);

    if pairs.is_empty() {
        return AccuracyReport {
            period,
            ensemble_accuracy: 0.0,
            by_lead_time: BTreeMap::new(),
            model_performance: Vec::new(),
        };
    }

    let temp_tolerance = MetricKind::Temperature.tolerance();
    let precip_tolerance = MetricKind::Precipitation.tolerance();
    let wind_tolerance = MetricKind::WindSpeed.tolerance();

    let mut ensemble_scores: Vec<f64> = Vec::new();
    let mut lead_time_scores: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    let mut model_temp_scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut model_precip_scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for pair in pairs {
        if let (Some(predicted), Some(actual)) =
            (pair.temperature_ensemble, pair.observed_temperature)
        {
            let temp_score = accuracy_score(predicted, actual, temp_tolerance);

            let precip_score = match (pair.precipitation_ensemble, pair.observed_precipitation) {
                (Some(p), Some(a)) => accuracy_score(p, a, precip_tolerance),
                _ => 100.0,
            };
            let wind_score = match (pair.wind_speed_ensemble, pair.observed_wind_speed) {
                (Some(p), Some(a)) => accuracy_score(p, a, wind_tolerance),
                _ => 100.0,
            };

            let overall = (temp_score + precip_score + wind_score) / 3.0;
            ensemble_scores.push(overall);
            lead_time_scores.entry(pair.lead_hours).or_default().push(overall);
        }

        for (model, predicted) in &pair.temperature_by_model {
            let (Some(predicted), Some(actual)) = (predicted, pair.observed_temperature) else {
                continue;
            };

            model_temp_scores
                .entry(model.clone())
                .or_default()
                .push(accuracy_score(*predicted, actual, temp_tolerance));

            if let (Some(Some(precip_pred)), Some(precip_actual)) = (
                pair.precipitation_by_model.get(model),
                pair.observed_precipitation,
            ) {
                model_precip_scores
                    .entry(model.clone())
                    .or_default()
                    .push(accuracy_score(*precip_pred, precip_actual, precip_tolerance));
            }
        }
    }

    let by_lead_time = lead_time_scores
        .into_iter()
        .map(|(lead, scores)| (format!("{}h", lead), round_to(mean(&scores), 1)))
        .collect();

    let mut model_performance: Vec<ModelAccuracy> = model_temp_scores
        .into_iter()
        .map(|(model_name, temp_scores)| {
            let temp_accuracy = mean(&temp_scores);
            let precip_accuracy = model_precip_scores
                .get(&model_name)
                .filter(|scores| !scores.is_empty())
                .map(|scores| mean(scores))
                .unwrap_or(100.0);
            let overall = (temp_accuracy + precip_accuracy) / 2.0;

            ModelAccuracy {
                model_name,
                temperature_accuracy: round_to(temp_accuracy, 1),
                precipitation_accuracy: round_to(precip_accuracy, 1),
                overall_accuracy: round_to(overall, 1),
                sample_count: temp_scores.len(),
            }
        })
        .collect();

    model_performance.sort_by(|a, b| {
        b.overall_accuracy
            .partial_cmp(&a.overall_accuracy)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let ensemble_accuracy = if ensemble_scores.is_empty() {
        0.0
    } else {
        round_to(mean(&ensemble_scores), 1)
    };

    AccuracyReport {
        period,
        ensemble_accuracy,
        by_lead_time,
        model_performance,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
