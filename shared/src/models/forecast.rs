//! Ensemble forecast response models

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Current conditions, taken from the reference model rather than
/// aggregated - the instantaneous reading has no meaningful spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub weather_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aqi: Option<i32>,
}

/// One hourly ensemble point with its confidence score (0-100).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub precipitation: f64,
    pub precipitation_probability: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub humidity: f64,
    pub dew_point: f64,
    pub cloud_cover: f64,
    pub weather_code: i32,
    pub confidence: f64,
}

/// One daily ensemble point. Sunrise/sunset come verbatim from the
/// reference model - they are location facts, identical across models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub precipitation_sum: f64,
    pub precipitation_probability_max: f64,
    pub wind_speed_max: f64,
    pub weather_code: i32,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset: Option<String>,
}

/// Mean per-metric spread across the whole hourly horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadSummary {
    pub temperature: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
}

/// Coordinates and timezone the forecast was built for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

/// Full ensemble forecast for one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleForecastResponse {
    pub location: ForecastLocation,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyPoint>,
    pub model_spread: SpreadSummary,
}

/// Values one individual model predicts at a given hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub model_name: String,
    pub temperature: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
}

/// Side-by-side comparison of the individual models and the ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelComparisonResponse {
    pub location: ForecastLocation,
    pub time: NaiveDateTime,
    pub models: Vec<ModelPrediction>,
    pub ensemble: ModelPrediction,
}
