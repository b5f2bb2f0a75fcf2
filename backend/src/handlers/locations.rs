//! HTTP handlers for saved location management

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Duration;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use shared::models::location::CreateLocationInput;

use crate::error::{AppError, AppResult};
use crate::services::{AccuracyService, LocationService};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct IngestObservationsResponse {
    pub location_id: Uuid,
    pub inserted: u64,
}

/// Save a location for tracking forecast accuracy.
pub async fn create_location(
    State(state): State<AppState>,
    Json(input): Json<CreateLocationInput>,
) -> AppResult<Json<crate::services::location::Location>> {
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let location = LocationService::new(state.db.clone()).create(input).await?;
    Ok(Json(location))
}

/// List all saved locations.
pub async fn list_locations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<crate::services::location::Location>>> {
    let locations = LocationService::new(state.db.clone()).list().await?;
    Ok(Json(locations))
}

/// Get a saved location by ID.
pub async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<crate::services::location::Location>> {
    let location = LocationService::new(state.db.clone()).get(location_id).await?;
    Ok(Json(location))
}

/// Delete a saved location.
pub async fn delete_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<StatusResponse>> {
    LocationService::new(state.db.clone()).delete(location_id).await?;
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

/// Pull recent observed weather for a saved location into the
/// verification store.
pub async fn ingest_observations(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<IngestObservationsResponse>> {
    let location = LocationService::new(state.db.clone()).get(location_id).await?;

    let inserted = AccuracyService::new(state.db.clone())
        .with_match_tolerance(Duration::seconds(state.config.accuracy.match_tolerance_secs))
        .ingest_observations(
            &state.meteo,
            &location,
            state.config.accuracy.observation_backfill_days,
        )
        .await?;

    Ok(Json(IngestObservationsResponse {
        location_id,
        inserted,
    }))
}
