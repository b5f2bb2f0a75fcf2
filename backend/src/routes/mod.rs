//! Route definitions for the Weather Ensemble Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Ensemble forecast routes
        .nest("/forecast", forecast_routes())
        // Saved location routes
        .nest("/locations", location_routes())
        // Accuracy verification routes
        .nest("/accuracy", accuracy_routes())
}

/// Ensemble forecast routes
fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_ensemble_forecast))
        .route("/models", get(handlers::get_model_comparison))
        .route("/geocode", get(handlers::geocode_location))
}

/// Saved location routes
fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_locations).post(handlers::create_location))
        .route(
            "/:location_id",
            get(handlers::get_location).delete(handlers::delete_location),
        )
        .route("/:location_id/observations", post(handlers::ingest_observations))
}

/// Accuracy verification routes
fn accuracy_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_accuracy_metrics))
        .route("/badge", get(handlers::get_accuracy_badge))
        .route("/models", get(handlers::get_model_accuracy))
}
