//! Saved location service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::location::CreateLocationInput;

/// Saved location record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub timezone: String,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Service for managing saved locations
#[derive(Clone)]
pub struct LocationService {
    db: PgPool,
}

impl LocationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Save a location for quick access.
    pub async fn create(&self, input: CreateLocationInput) -> AppResult<Location> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM locations WHERE latitude = $1 AND longitude = $2)",
        )
        .bind(input.latitude)
        .bind(input.longitude)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("location".to_string()));
        }

        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (name, latitude, longitude, timezone, country)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, latitude, longitude, timezone, country, created_at
            "#,
        )
        .bind(&input.name)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.timezone)
        .bind(&input.country)
        .fetch_one(&self.db)
        .await?;

        Ok(location)
    }

    /// List all saved locations, newest first.
    pub async fn list(&self) -> AppResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, latitude, longitude, timezone, country, created_at
            FROM locations
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(locations)
    }

    /// Get a saved location by ID.
    pub async fn get(&self, location_id: Uuid) -> AppResult<Location> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, latitude, longitude, timezone, country, created_at
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(location_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Location".to_string()))?;

        Ok(location)
    }

    /// Delete a saved location and its verification history.
    pub async fn delete(&self, location_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(location_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Location".to_string()));
        }

        Ok(())
    }
}
