//! Open-Meteo API client for fetching weather data
//!
//! Talks to four endpoints: the forecast API (per-model predictions),
//! the archive API (reanalysis ground truth for verification), the
//! geocoding API (location search) and the air-quality API. Postal
//! code lookup goes to the third-party Zippopotam.us API.
//!
//! Individual model failures are logged and skipped; callers see the
//! model as absent. No retries happen here - forecasts are ephemeral
//! and retry policy belongs to the caller.

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::task::JoinSet;

use crate::config::EnsembleConfig;

const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";
const ZIPPOPOTAM_URL: &str = "https://api.zippopotam.us";

// Query parameters follow WMO naming: "_2m" and "_10m" are the
// measurement heights above ground.
const HOURLY_PARAMS: &str = "temperature_2m,relative_humidity_2m,dew_point_2m,cloud_cover,\
precipitation,precipitation_probability,weather_code,wind_speed_10m,wind_direction_10m";

const DAILY_PARAMS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,\
precipitation_probability_max,weather_code,wind_speed_10m_max,sunrise,sunset";

const CURRENT_PARAMS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,\
precipitation,weather_code,wind_speed_10m,wind_direction_10m,uv_index,visibility";

const HISTORICAL_HOURLY_PARAMS: &str = "temperature_2m,precipitation,wind_speed_10m,weather_code";

/// Client for fetching weather data from the Open-Meteo APIs.
///
/// Clones share the underlying reqwest connection pool, so per-model
/// fan-out reuses TCP connections.
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    models: Vec<String>,
}

/// One model's raw forecast payload. Arrays inside each section are
/// aligned by time index across all models for a given request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelPayload {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub current: CurrentSection,
    #[serde(default)]
    pub hourly: HourlySeries,
    #[serde(default)]
    pub daily: DailySeries,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentSection {
    pub temperature_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
    pub uv_index: Option<f64>,
    pub visibility: Option<f64>,
}

/// Hourly forecast arrays. A model that does not provide a field
/// yields an empty array; a model with gaps yields `null` entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub dew_point_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub cloud_cover: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_direction_10m: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub sunrise: Vec<String>,
    #[serde(default)]
    pub sunset: Vec<String>,
}

/// Archive (reanalysis) payload for observation ingestion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationPayload {
    #[serde(default)]
    pub hourly: ObservationSeries,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationSeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<f64>>,
}

/// A geocoding match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AirQualityResponse {
    current: Option<AirQualityCurrent>,
}

#[derive(Debug, Deserialize)]
struct AirQualityCurrent {
    us_aqi: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingEntry>,
}

#[derive(Debug, Deserialize)]
struct GeocodingEntry {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZippopotamResponse {
    country: Option<String>,
    #[serde(default)]
    places: Vec<ZippopotamPlace>,
}

#[derive(Debug, Deserialize)]
struct ZippopotamPlace {
    #[serde(rename = "place name")]
    place_name: Option<String>,
    // Zippopotam returns coordinates as strings
    latitude: Option<String>,
    longitude: Option<String>,
    state: Option<String>,
}

impl OpenMeteoClient {
    /// Create a client from the ensemble configuration.
    pub fn new(config: &EnsembleConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            models: config.models.clone(),
        }
    }

    /// Fetch the forecast from a single model. Failures log a warning
    /// and return `None` so one model never takes down the ensemble.
    pub async fn fetch_model(
        &self,
        latitude: f64,
        longitude: f64,
        model: &str,
    ) -> Option<ModelPayload> {
        let result = self
            .client
            .get(format!("{}/forecast", self.base_url))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("hourly", HOURLY_PARAMS.to_string()),
                ("daily", DAILY_PARAMS.to_string()),
                ("current", CURRENT_PARAMS.to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", "10".to_string()),
                ("models", model.to_string()),
            ])
            .send()
            .await;

        match result {
            Ok(response) => match response.error_for_status() {
                Ok(response) => match response.json::<ModelPayload>().await {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        tracing::warn!("Failed to parse payload for {}: {}", model, e);
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!("Error fetching {}: {}", model, e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Error fetching {}: {}", model, e);
                None
            }
        }
    }

    /// Fetch forecasts from all configured models concurrently.
    ///
    /// Models that failed are simply absent from the result. An empty
    /// map means total source unavailability.
    pub async fn fetch_all_models(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> BTreeMap<String, ModelPayload> {
        let mut tasks = JoinSet::new();
        for model in self.models.clone() {
            let client = self.clone();
            tasks.spawn(async move {
                let payload = client.fetch_model(latitude, longitude, &model).await;
                (model, payload)
            });
        }

        let mut model_data = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((model, Some(payload))) => {
                    model_data.insert(model, payload);
                }
                Ok((_, None)) => {}
                Err(e) => tracing::warn!("Model fetch task failed: {}", e),
            }
        }

        model_data
    }

    /// Fetch the current US AQI for a location, if available.
    pub async fn fetch_air_quality(&self, latitude: f64, longitude: f64) -> Option<f64> {
        let result = self
            .client
            .get(AIR_QUALITY_URL)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", "us_aqi,pm2_5,pm10".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await;

        match result {
            Ok(response) => response
                .json::<AirQualityResponse>()
                .await
                .ok()
                .and_then(|data| data.current)
                .and_then(|current| current.us_aqi),
            Err(e) => {
                tracing::warn!("Error fetching air quality: {}", e);
                None
            }
        }
    }

    /// Fetch historical observations from the archive API.
    ///
    /// The archive serves ERA5 reanalysis data - the ground truth for
    /// verification - and typically lags ~5 days behind the present.
    pub async fn fetch_observations(
        &self,
        latitude: f64,
        longitude: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Option<ObservationPayload> {
        let result = self
            .client
            .get(ARCHIVE_URL)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("start_date", start_date.to_string()),
                ("end_date", end_date.to_string()),
                ("hourly", HISTORICAL_HOURLY_PARAMS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await;

        match result {
            Ok(response) => match response.json::<ObservationPayload>().await {
                Ok(payload) => Some(payload),
                Err(e) => {
                    tracing::warn!("Failed to parse historical data: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Error fetching historical data: {}", e);
                None
            }
        }
    }

    /// Search for locations by name.
    pub async fn geocode(&self, query: &str, limit: usize) -> Vec<GeocodeResult> {
        let result = self
            .client
            .get(GEOCODING_URL)
            .query(&[
                ("name", query.to_string()),
                ("count", limit.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await;

        match result {
            Ok(response) => response
                .json::<GeocodingResponse>()
                .await
                .map(|data| {
                    data.results
                        .into_iter()
                        .map(|entry| GeocodeResult {
                            name: entry.name,
                            latitude: entry.latitude,
                            longitude: entry.longitude,
                            country: entry.country,
                            admin1: entry.admin1,
                            timezone: entry.timezone,
                            postal_code: None,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Error geocoding: {}", e);
                Vec::new()
            }
        }
    }

    /// Look up a postal code via Zippopotam.us. Unknown codes return
    /// HTTP 404, which surfaces here as `None`.
    pub async fn geocode_zip(&self, zip_code: &str, country: &str) -> Option<GeocodeResult> {
        let result = self
            .client
            .get(format!("{}/{}/{}", ZIPPOPOTAM_URL, country, zip_code))
            .send()
            .await;

        let response = match result {
            Ok(response) => match response.error_for_status() {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Error geocoding zip: {}", e);
                    return None;
                }
            },
            Err(e) => {
                tracing::warn!("Error geocoding zip: {}", e);
                return None;
            }
        };

        let data = response.json::<ZippopotamResponse>().await.ok()?;
        let place = data.places.into_iter().next()?;

        Some(GeocodeResult {
            name: place.place_name.unwrap_or_else(|| zip_code.to_string()),
            latitude: place.latitude.and_then(|v| v.parse().ok()).unwrap_or(0.0),
            longitude: place.longitude.and_then(|v| v.parse().ok()).unwrap_or(0.0),
            country: data.country,
            admin1: place.state,
            timezone: None,
            postal_code: Some(zip_code.to_string()),
        })
    }
}

/// Parse an Open-Meteo hourly timestamp ("2024-06-01T13:00").
pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Parse an Open-Meteo daily date ("2024-06-01").
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
