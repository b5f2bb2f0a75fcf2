//! Forecast accuracy report models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Accuracy summary for one forecast model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAccuracy {
    pub model_name: String,
    pub temperature_accuracy: f64,
    pub precipitation_accuracy: f64,
    pub overall_accuracy: f64,
    pub sample_count: usize,
}

/// Verification report over a trailing day window.
///
/// `by_lead_time` maps `"24h"`, `"48h"`, ... to the mean overall score
/// for snapshots taken that far ahead. An empty report (no matched
/// pairs yet) has accuracy 0 and no entries; that is a defined state,
/// not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub period: String,
    pub ensemble_accuracy: f64,
    pub by_lead_time: BTreeMap<String, f64>,
    pub model_performance: Vec<ModelAccuracy>,
}

/// Compact accuracy view for UI display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyBadge {
    pub text: String,
    pub accuracy: f64,
    pub sample_count: usize,
    pub lead_hours: i64,
}

/// Per-model accuracy listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAccuracyList {
    pub period: String,
    pub models: Vec<ModelAccuracy>,
}
