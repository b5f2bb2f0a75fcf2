//! Forecast accuracy verification service
//!
//! Stores snapshots of ensemble predictions at fixed lead times,
//! ingests observed ground truth from the archive API, and joins the
//! two to measure how accurate past forecasts actually were.
//!
//! Snapshots and observations are append-only facts. Snapshot rows for
//! one forecast generation commit as a single transaction so a partial
//! write can never skew verification for that generation instant.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::accuracy::{AccuracyBadge, AccuracyReport};
use shared::models::forecast::EnsembleForecastResponse;
use shared::scoring::{matches_within, summarize, MatchedPair};
use shared::types::LEAD_HOURS;

use crate::error::AppResult;
use crate::external::open_meteo::{parse_time, ModelPayload, OpenMeteoClient};
use crate::services::ensemble::hourly_values;
use crate::services::location::Location;

/// Service for recording and verifying forecast accuracy
#[derive(Clone)]
pub struct AccuracyService {
    db: PgPool,
    match_tolerance: Duration,
}

/// One row of the snapshot/observation join.
#[derive(Debug, FromRow)]
struct MatchedRow {
    lead_hours: i32,
    target_time: NaiveDateTime,
    temperature_ensemble: Option<f64>,
    precipitation_ensemble: Option<f64>,
    wind_speed_ensemble: Option<f64>,
    temperature_by_model: Option<serde_json::Value>,
    precipitation_by_model: Option<serde_json::Value>,
    wind_speed_by_model: Option<serde_json::Value>,
    observation_time: NaiveDateTime,
    temperature: Option<f64>,
    precipitation: Option<f64>,
    wind_speed: Option<f64>,
}

impl AccuracyService {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            match_tolerance: Duration::hours(1),
        }
    }

    /// Override the snapshot/observation matching window.
    pub fn with_match_tolerance(mut self, tolerance: Duration) -> Self {
        self.match_tolerance = tolerance;
        self
    }

    /// Store snapshots of a freshly built forecast for later
    /// verification, one row per configured lead time.
    ///
    /// Lead times beyond the fetched horizon are silently skipped.
    /// Returns the number of rows written.
    pub async fn record_snapshots(
        &self,
        location_id: Uuid,
        model_data: &BTreeMap<String, ModelPayload>,
        forecast: &EnsembleForecastResponse,
    ) -> AppResult<u64> {
        let Some(reference) = model_data.values().next() else {
            return Ok(0);
        };
        let hourly_times = &reference.hourly.time;
        let snapshot_time = Utc::now().naive_utc();

        let mut tx = self.db.begin().await?;
        let mut written = 0u64;

        for &lead in LEAD_HOURS.iter() {
            if lead >= hourly_times.len() || lead >= forecast.hourly.len() {
                continue;
            }
            let Some(target_time) = parse_time(&hourly_times[lead]) else {
                continue;
            };

            let point = &forecast.hourly[lead];
            let temperature_by_model = hourly_values(model_data, lead, |h| &h.temperature_2m);
            let precipitation_by_model = hourly_values(model_data, lead, |h| &h.precipitation);
            let wind_speed_by_model = hourly_values(model_data, lead, |h| &h.wind_speed_10m);

            sqlx::query(
                r#"
                INSERT INTO forecast_snapshots (
                    location_id, snapshot_time, target_time, lead_hours,
                    temperature_ensemble, precipitation_ensemble, wind_speed_ensemble,
                    confidence_score,
                    temperature_by_model, precipitation_by_model, wind_speed_by_model
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(location_id)
            .bind(snapshot_time)
            .bind(target_time)
            .bind(lead as i32)
            .bind(point.temperature)
            .bind(point.precipitation)
            .bind(point.wind_speed)
            .bind(point.confidence)
            .bind(serde_json::to_value(&temperature_by_model).unwrap_or_default())
            .bind(serde_json::to_value(&precipitation_by_model).unwrap_or_default())
            .bind(serde_json::to_value(&wind_speed_by_model).unwrap_or_default())
            .execute(&mut *tx)
            .await?;

            written += 1;
        }

        tx.commit().await?;

        tracing::debug!(
            location_id = %location_id,
            snapshots = written,
            "Recorded forecast snapshots"
        );

        Ok(written)
    }

    /// Fetch trailing observations for a location and store the new
    /// ones. Rows that already exist for `(location, observation_time)`
    /// are skipped by the uniqueness constraint, so re-ingestion (even
    /// concurrent) is a no-op. Returns the number of inserted rows.
    pub async fn ingest_observations(
        &self,
        client: &OpenMeteoClient,
        location: &Location,
        backfill_days: i64,
    ) -> AppResult<u64> {
        let end_date = Utc::now().date_naive();
        let start_date = end_date - Duration::days(backfill_days);

        let latitude = location.latitude.to_f64().unwrap_or_default();
        let longitude = location.longitude.to_f64().unwrap_or_default();

        let Some(payload) = client
            .fetch_observations(latitude, longitude, start_date, end_date)
            .await
        else {
            return Ok(0);
        };

        let hourly = &payload.hourly;
        let mut inserted = 0u64;

        for (i, time_str) in hourly.time.iter().enumerate() {
            let Some(observation_time) = parse_time(time_str) else {
                continue;
            };

            let value_at = |series: &[Option<f64>]| series.get(i).copied().flatten();

            let result = sqlx::query(
                r#"
                INSERT INTO observations (
                    location_id, observation_time,
                    temperature, precipitation, wind_speed, weather_code
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (location_id, observation_time) DO NOTHING
                "#,
            )
            .bind(location.id)
            .bind(observation_time)
            .bind(value_at(&hourly.temperature_2m))
            .bind(value_at(&hourly.precipitation))
            .bind(value_at(&hourly.wind_speed_10m))
            .bind(value_at(&hourly.weather_code).map(|code| code as i32))
            .execute(&self.db)
            .await?;

            inserted += result.rows_affected();
        }

        tracing::debug!(
            location_id = %location.id,
            inserted,
            "Ingested observations"
        );

        Ok(inserted)
    }

    /// Compare stored snapshots against observations and summarize
    /// accuracy per lead time and per model.
    ///
    /// Zero matched pairs yields the defined empty report, not an
    /// error - verification data simply has not accumulated yet.
    pub async fn calculate_accuracy(
        &self,
        location_id: Option<Uuid>,
        days: i64,
    ) -> AppResult<AccuracyReport> {
        let cutoff = Utc::now().naive_utc() - Duration::days(days);
        let tolerance_secs = self.match_tolerance.num_seconds() as f64;

        let rows = sqlx::query_as::<_, MatchedRow>(
            r#"
            SELECT fs.lead_hours, fs.target_time,
                   fs.temperature_ensemble, fs.precipitation_ensemble, fs.wind_speed_ensemble,
                   fs.temperature_by_model, fs.precipitation_by_model, fs.wind_speed_by_model,
                   o.observation_time, o.temperature, o.precipitation, o.wind_speed
            FROM forecast_snapshots fs
            JOIN observations o
              ON o.location_id = fs.location_id
             AND ABS(EXTRACT(EPOCH FROM (fs.target_time - o.observation_time))) < $1
            WHERE fs.snapshot_time >= $2
              AND ($3::uuid IS NULL OR fs.location_id = $3)
            "#,
        )
        .bind(tolerance_secs)
        .bind(cutoff)
        .bind(location_id)
        .fetch_all(&self.db)
        .await?;

        let pairs: Vec<MatchedPair> = rows
            .into_iter()
            .map(MatchedPair::from)
            .filter(|pair| {
                matches_within(pair.target_time, pair.observation_time, self.match_tolerance)
            })
            .collect();

        Ok(summarize(&pairs, days))
    }

    /// Compact accuracy view for one lead time, based on the trailing
    /// 30 days.
    pub async fn accuracy_badge(
        &self,
        location_id: Option<Uuid>,
        lead_hours: i64,
    ) -> AppResult<AccuracyBadge> {
        let report = self.calculate_accuracy(location_id, 30).await?;

        let accuracy = report
            .by_lead_time
            .get(&format!("{}h", lead_hours))
            .copied()
            .unwrap_or(0.0);

        let text = if accuracy > 0.0 {
            format!("{}% accurate for {}h forecasts", accuracy as i64, lead_hours)
        } else {
            "Collecting accuracy data...".to_string()
        };

        let sample_count = report
            .model_performance
            .iter()
            .map(|model| model.sample_count)
            .sum();

        Ok(AccuracyBadge {
            text,
            accuracy,
            sample_count,
            lead_hours,
        })
    }
}

impl From<MatchedRow> for MatchedPair {
    fn from(row: MatchedRow) -> Self {
        MatchedPair {
            lead_hours: row.lead_hours,
            target_time: row.target_time,
            observation_time: row.observation_time,
            temperature_ensemble: row.temperature_ensemble,
            precipitation_ensemble: row.precipitation_ensemble,
            wind_speed_ensemble: row.wind_speed_ensemble,
            temperature_by_model: model_map(row.temperature_by_model),
            precipitation_by_model: model_map(row.precipitation_by_model),
            wind_speed_by_model: model_map(row.wind_speed_by_model),
            observed_temperature: row.temperature,
            observed_precipitation: row.precipitation,
            observed_wind_speed: row.wind_speed,
        }
    }
}

fn model_map(value: Option<serde_json::Value>) -> BTreeMap<String, Option<f64>> {
    value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}
