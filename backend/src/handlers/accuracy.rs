//! HTTP handlers for accuracy verification endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Duration;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::accuracy::{AccuracyBadge, AccuracyReport, ModelAccuracyList};

use crate::error::{AppError, AppResult};
use crate::services::AccuracyService;
use crate::AppState;

const DEFAULT_WINDOW_DAYS: i64 = 30;
const DEFAULT_BADGE_LEAD_HOURS: i64 = 72;

/// Query parameters for accuracy reports
#[derive(Debug, Deserialize)]
pub struct AccuracyQuery {
    pub location_id: Option<Uuid>,
    pub days: Option<i64>,
}

/// Get forecast accuracy metrics for the trailing window.
pub async fn get_accuracy_metrics(
    State(state): State<AppState>,
    Query(query): Query<AccuracyQuery>,
) -> AppResult<Json<AccuracyReport>> {
    let days = validate_days(query.days)?;

    let report = accuracy_service(&state)
        .calculate_accuracy(query.location_id, days)
        .await?;

    Ok(Json(report))
}

/// Query parameters for the accuracy badge
#[derive(Debug, Deserialize)]
pub struct BadgeQuery {
    pub location_id: Option<Uuid>,
    pub lead_hours: Option<i64>,
}

/// Get a compact accuracy badge suitable for display next to a
/// forecast.
pub async fn get_accuracy_badge(
    State(state): State<AppState>,
    Query(query): Query<BadgeQuery>,
) -> AppResult<Json<AccuracyBadge>> {
    let lead_hours = query.lead_hours.unwrap_or(DEFAULT_BADGE_LEAD_HOURS);

    let badge = accuracy_service(&state)
        .accuracy_badge(query.location_id, lead_hours)
        .await?;

    Ok(Json(badge))
}

/// Query parameters for per-model accuracy
#[derive(Debug, Deserialize)]
pub struct ModelAccuracyQuery {
    pub days: Option<i64>,
}

/// Get accuracy rankings for the individual forecast models.
pub async fn get_model_accuracy(
    State(state): State<AppState>,
    Query(query): Query<ModelAccuracyQuery>,
) -> AppResult<Json<ModelAccuracyList>> {
    let days = validate_days(query.days)?;

    let report = accuracy_service(&state).calculate_accuracy(None, days).await?;

    Ok(Json(ModelAccuracyList {
        period: report.period,
        models: report.model_performance,
    }))
}

fn accuracy_service(state: &AppState) -> AccuracyService {
    AccuracyService::new(state.db.clone())
        .with_match_tolerance(Duration::seconds(state.config.accuracy.match_tolerance_secs))
}

fn validate_days(days: Option<i64>) -> AppResult<i64> {
    let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
    if !(7..=90).contains(&days) {
        return Err(AppError::Validation {
            field: "days".to_string(),
            message: "days must be within [7, 90]".to_string(),
        });
    }
    Ok(days)
}
