//! Ensemble aggregation primitives
//!
//! Combines per-model predictions into a single ensemble value with an
//! uncertainty estimate. A model that returned no value for a field is
//! `None` and is excluded from aggregation; absence is never zero.

use std::collections::{BTreeMap, HashMap};

use crate::types::MetricKind;

/// Per-model weights used for the ensemble mean.
///
/// Weights are static process-wide configuration, passed explicitly so
/// callers can override them per request (e.g. for future dynamic
/// reweighting). A model missing from the table weighs 1.0.
pub type WeightTable = HashMap<String, f64>;

/// Result of aggregating one field across models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateResult {
    /// Weight-normalized mean over models with a present value.
    pub mean: f64,
    /// Unweighted population standard deviation of the same values.
    pub spread: f64,
}

impl AggregateResult {
    pub const ZERO: AggregateResult = AggregateResult { mean: 0.0, spread: 0.0 };
}

/// Compute the weighted mean and spread of one field across models.
///
/// Weights are normalized to sum 1.0 over the models that actually
/// reported a value, so a partial set of models does not bias the mean
/// toward the missing ones. The spread stays unweighted: it measures
/// raw inter-model disagreement, not a trust-adjusted estimate.
///
/// With no present values the result is exactly `(0.0, 0.0)`.
pub fn weighted_average(
    values: &BTreeMap<String, Option<f64>>,
    weights: &WeightTable,
) -> AggregateResult {
    let mut valid_values = Vec::with_capacity(values.len());
    let mut valid_weights = Vec::with_capacity(values.len());

    for (model, value) in values {
        if let Some(v) = value {
            valid_values.push(*v);
            valid_weights.push(weights.get(model).copied().unwrap_or(1.0));
        }
    }

    if valid_values.is_empty() {
        return AggregateResult::ZERO;
    }

    let weight_sum: f64 = valid_weights.iter().sum();
    let mean: f64 = valid_values
        .iter()
        .zip(&valid_weights)
        .map(|(v, w)| v * w / weight_sum)
        .sum();

    let count = valid_values.len() as f64;
    let arithmetic_mean = valid_values.iter().sum::<f64>() / count;
    let variance = valid_values
        .iter()
        .map(|v| (v - arithmetic_mean).powi(2))
        .sum::<f64>()
        / count;

    AggregateResult { mean, spread: variance.sqrt() }
}

/// Confidence score (0-100) for a given inter-model spread.
///
/// Exponential decay, not linear: 100 at zero spread, ~37 at one
/// typical spread, ~14 at two. Disagreement is penalized aggressively
/// so uncertainty is flagged early.
pub fn confidence_score(spread: f64, metric: MetricKind) -> f64 {
    let confidence = 100.0 * (-spread / metric.typical_spread()).exp();
    confidence.clamp(0.0, 100.0)
}

/// Resolve a categorical weather code across models.
///
/// Codes are categorical (0=clear, 61=rain, 95=thunderstorm), so the
/// ensemble takes the statistical mode rather than an average. Ties
/// resolve to the numerically largest code, which denotes the more
/// severe condition in the WMO encoding. No present values yields 0.
pub fn resolve_weather_code(values: &BTreeMap<String, Option<f64>>) -> i32 {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for value in values.values().flatten() {
        *counts.entry(*value as i32).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|(code_a, count_a), (code_b, count_b)| {
            count_a.cmp(count_b).then(code_a.cmp(code_b))
        })
        .map(|(code, _)| code)
        .unwrap_or(0)
}

/// Round to a fixed number of decimal digits, matching the precision
/// each forecast field is reported with.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}
