//! HTTP handlers for ensemble forecast endpoints

use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::models::forecast::{EnsembleForecastResponse, ModelComparisonResponse};
use shared::types::HOURLY_HORIZON;
use shared::validation::coordinates_in_range;

use crate::error::{AppError, AppResult};
use crate::external::open_meteo::GeocodeResult;
use crate::services::{AccuracyService, EnsembleService, LocationService};
use crate::AppState;

/// Query parameters for forecast requests
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub lat: f64,
    pub lon: f64,
    /// When set, the built forecast is also recorded as verification
    /// snapshots for this saved location.
    pub location_id: Option<Uuid>,
}

/// Get the ensemble weather forecast combining all configured models.
pub async fn get_ensemble_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> AppResult<Json<EnsembleForecastResponse>> {
    validate_coordinates(query.lat, query.lon)?;

    let (model_data, air_quality) = tokio::join!(
        state.meteo.fetch_all_models(query.lat, query.lon),
        state.meteo.fetch_air_quality(query.lat, query.lon),
    );

    let service = EnsembleService::new(&state.config.ensemble);
    let forecast = service.build_forecast(&model_data, air_quality, query.lat, query.lon)?;

    if let Some(location_id) = query.location_id {
        let location = LocationService::new(state.db.clone()).get(location_id).await?;
        AccuracyService::new(state.db.clone())
            .record_snapshots(location.id, &model_data, &forecast)
            .await?;
    }

    Ok(Json(forecast))
}

/// Query parameters for model comparison
#[derive(Debug, Deserialize)]
pub struct ComparisonQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub hour_offset: usize,
}

/// Get individual model predictions alongside the ensemble values.
pub async fn get_model_comparison(
    State(state): State<AppState>,
    Query(query): Query<ComparisonQuery>,
) -> AppResult<Json<ModelComparisonResponse>> {
    validate_coordinates(query.lat, query.lon)?;
    if query.hour_offset > HOURLY_HORIZON {
        return Err(AppError::Validation {
            field: "hour_offset".to_string(),
            message: format!("hour_offset must be within [0, {}]", HOURLY_HORIZON),
        });
    }

    let model_data = state.meteo.fetch_all_models(query.lat, query.lon).await;

    let service = EnsembleService::new(&state.config.ensemble);
    let comparison =
        service.model_comparison(&model_data, query.hour_offset, query.lat, query.lon)?;

    Ok(Json(comparison))
}

/// Query parameters for location search
#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GeocodeResponse {
    pub results: Vec<GeocodeResult>,
}

/// Search for locations by name or US ZIP code.
pub async fn geocode_location(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> AppResult<Json<GeocodeResponse>> {
    let search = query.query.trim();
    if search.len() < 2 {
        return Err(AppError::Validation {
            field: "query".to_string(),
            message: "query must be at least 2 characters".to_string(),
        });
    }
    let limit = query.limit.unwrap_or(5).clamp(1, 10);

    let mut results = Vec::new();

    let compact: String = search.chars().filter(|c| c.is_ascii_digit()).collect();
    if compact.len() == 5 && compact.len() == search.replace(['-', ' '], "").len() {
        if let Some(zip_match) = state.meteo.geocode_zip(&compact, "us").await {
            results.push(zip_match);
        }
    }

    // Also search by name, in case the ZIP lookup failed or the query
    // is also a place name.
    results.extend(state.meteo.geocode(search, limit).await);

    // De-duplicate by coordinates within ~0.01 degrees
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for result in results {
        let key = (
            (result.latitude * 100.0).round() as i64,
            (result.longitude * 100.0).round() as i64,
        );
        if seen.insert(key) {
            unique.push(result);
        }
    }
    unique.truncate(limit);

    Ok(Json(GeocodeResponse { results: unique }))
}

fn validate_coordinates(latitude: f64, longitude: f64) -> AppResult<()> {
    if !coordinates_in_range(latitude, longitude) {
        return Err(AppError::ValidationError(
            "latitude must be within [-90, 90] and longitude within [-180, 180]".to_string(),
        ));
    }
    Ok(())
}
