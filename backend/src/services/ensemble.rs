//! Ensemble forecast builder
//!
//! Drives the shared aggregation primitives across the per-model time
//! series to produce one combined forecast. Weighted averaging evens
//! out individual model biases; the spread between models feeds the
//! per-point confidence score.

use std::collections::BTreeMap;

use shared::ensemble::{
    confidence_score, resolve_weather_code, round_to, weighted_average, WeightTable,
};
use shared::models::forecast::{
    CurrentConditions, DailyPoint, EnsembleForecastResponse, ForecastLocation, HourlyPoint,
    ModelComparisonResponse, ModelPrediction, SpreadSummary,
};
use shared::types::{MetricKind, HOURLY_HORIZON};

use crate::config::EnsembleConfig;
use crate::error::{AppError, AppResult};
use crate::external::open_meteo::{parse_date, parse_time, DailySeries, HourlySeries, ModelPayload};

/// Builds ensemble forecasts from raw per-model payloads.
///
/// Holds the configured model order (the first available model serves
/// as the reference for current conditions and time axes) and the
/// weight table. Pure over its inputs; fetching happens elsewhere.
#[derive(Clone)]
pub struct EnsembleService {
    models: Vec<String>,
    weights: WeightTable,
}

/// Extract one hourly field at one time index from every model.
pub fn hourly_values<F>(
    model_data: &BTreeMap<String, ModelPayload>,
    index: usize,
    field: F,
) -> BTreeMap<String, Option<f64>>
where
    F: Fn(&HourlySeries) -> &[Option<f64>],
{
    model_data
        .iter()
        .map(|(model, payload)| {
            let value = field(&payload.hourly).get(index).copied().flatten();
            (model.clone(), value)
        })
        .collect()
}

/// Extract one daily field at one day index from every model.
fn daily_values<F>(
    model_data: &BTreeMap<String, ModelPayload>,
    index: usize,
    field: F,
) -> BTreeMap<String, Option<f64>>
where
    F: Fn(&DailySeries) -> &[Option<f64>],
{
    model_data
        .iter()
        .map(|(model, payload)| {
            let value = field(&payload.daily).get(index).copied().flatten();
            (model.clone(), value)
        })
        .collect()
}

impl EnsembleService {
    pub fn new(config: &EnsembleConfig) -> Self {
        Self {
            models: config.models.clone(),
            weights: config.weights.clone(),
        }
    }

    /// Pick the reference model: the first configured model that
    /// returned a payload.
    fn reference<'a>(
        &self,
        model_data: &'a BTreeMap<String, ModelPayload>,
    ) -> AppResult<&'a ModelPayload> {
        self.models
            .iter()
            .find_map(|model| model_data.get(model))
            .or_else(|| model_data.values().next())
            .ok_or(AppError::NoForecastData)
    }

    /// Build the full ensemble forecast from raw model payloads.
    ///
    /// Fails only when no model returned usable data; any partial
    /// subset of models is aggregated normally.
    pub fn build_forecast(
        &self,
        model_data: &BTreeMap<String, ModelPayload>,
        air_quality: Option<f64>,
        latitude: f64,
        longitude: f64,
    ) -> AppResult<EnsembleForecastResponse> {
        let reference = self.reference(model_data)?;

        let current = self.build_current(reference, air_quality);

        let mut hourly = Vec::new();
        let mut temp_spreads = Vec::new();
        let mut precip_spreads = Vec::new();
        let mut wind_spreads = Vec::new();

        for (i, time_str) in reference.hourly.time.iter().take(HOURLY_HORIZON).enumerate() {
            let Some(time) = parse_time(time_str) else {
                continue;
            };

            let temp = weighted_average(
                &hourly_values(model_data, i, |h| &h.temperature_2m),
                &self.weights,
            );
            let precip = weighted_average(
                &hourly_values(model_data, i, |h| &h.precipitation),
                &self.weights,
            );
            let precip_prob = weighted_average(
                &hourly_values(model_data, i, |h| &h.precipitation_probability),
                &self.weights,
            );
            let wind = weighted_average(
                &hourly_values(model_data, i, |h| &h.wind_speed_10m),
                &self.weights,
            );
            let wind_dir = weighted_average(
                &hourly_values(model_data, i, |h| &h.wind_direction_10m),
                &self.weights,
            );
            let humidity = weighted_average(
                &hourly_values(model_data, i, |h| &h.relative_humidity_2m),
                &self.weights,
            );
            let dew_point = weighted_average(
                &hourly_values(model_data, i, |h| &h.dew_point_2m),
                &self.weights,
            );
            let cloud_cover = weighted_average(
                &hourly_values(model_data, i, |h| &h.cloud_cover),
                &self.weights,
            );

            temp_spreads.push(temp.spread);
            precip_spreads.push(precip.spread);
            wind_spreads.push(wind.spread);

            let confidence = (confidence_score(temp.spread, MetricKind::Temperature)
                + confidence_score(precip.spread, MetricKind::Precipitation)
                + confidence_score(wind.spread, MetricKind::WindSpeed))
                / 3.0;

            let weather_code =
                resolve_weather_code(&hourly_values(model_data, i, |h| &h.weather_code));

            hourly.push(HourlyPoint {
                time,
                temperature: round_to(temp.mean, 1),
                precipitation: round_to(precip.mean, 1),
                precipitation_probability: round_to(precip_prob.mean, 0),
                wind_speed: round_to(wind.mean, 1),
                wind_direction: round_to(wind_dir.mean, 0),
                humidity: round_to(humidity.mean, 0),
                dew_point: round_to(dew_point.mean, 1),
                cloud_cover: round_to(cloud_cover.mean, 0),
                weather_code,
                confidence: round_to(confidence, 0),
            });
        }

        let daily = self.build_daily(model_data, reference, &hourly);

        let model_spread = SpreadSummary {
            temperature: round_to(mean_or_zero(&temp_spreads), 2),
            precipitation: round_to(mean_or_zero(&precip_spreads), 2),
            wind_speed: round_to(mean_or_zero(&wind_spreads), 2),
        };

        Ok(EnsembleForecastResponse {
            location: ForecastLocation {
                latitude,
                longitude,
                timezone: reference.timezone.clone().unwrap_or_else(|| "UTC".to_string()),
            },
            current,
            hourly,
            daily,
            model_spread,
        })
    }

    fn build_current(
        &self,
        reference: &ModelPayload,
        air_quality: Option<f64>,
    ) -> CurrentConditions {
        let current = &reference.current;
        CurrentConditions {
            temperature: current.temperature_2m.unwrap_or(0.0),
            apparent_temperature: current.apparent_temperature.unwrap_or(0.0),
            humidity: current.relative_humidity_2m.unwrap_or(0.0),
            precipitation: current.precipitation.unwrap_or(0.0),
            wind_speed: current.wind_speed_10m.unwrap_or(0.0),
            wind_direction: current.wind_direction_10m.unwrap_or(0.0),
            weather_code: current.weather_code.unwrap_or(0.0) as i32,
            uv_index: current.uv_index,
            visibility: current.visibility,
            aqi: air_quality.map(|aqi| aqi.round() as i32),
        }
    }

    fn build_daily(
        &self,
        model_data: &BTreeMap<String, ModelPayload>,
        reference: &ModelPayload,
        hourly: &[HourlyPoint],
    ) -> Vec<DailyPoint> {
        let mut daily = Vec::new();

        for (i, date_str) in reference.daily.time.iter().enumerate() {
            let Some(date) = parse_date(date_str) else {
                continue;
            };

            let temp_max = weighted_average(
                &daily_values(model_data, i, |d| &d.temperature_2m_max),
                &self.weights,
            );
            let temp_min = weighted_average(
                &daily_values(model_data, i, |d| &d.temperature_2m_min),
                &self.weights,
            );
            let precip_sum = weighted_average(
                &daily_values(model_data, i, |d| &d.precipitation_sum),
                &self.weights,
            );
            let precip_prob = weighted_average(
                &daily_values(model_data, i, |d| &d.precipitation_probability_max),
                &self.weights,
            );
            let wind_max = weighted_average(
                &daily_values(model_data, i, |d| &d.wind_speed_10m_max),
                &self.weights,
            );

            // Some models report a 0% daily precipitation probability even
            // when their own hourly data shows rain. Fall back to the max
            // hourly probability for that calendar day.
            let mut precip_prob_max = precip_prob.mean;
            if precip_prob_max == 0.0 {
                let day_start = i * 24;
                let day_end = (day_start + 24).min(hourly.len());
                if day_start < hourly.len() {
                    precip_prob_max = hourly[day_start..day_end]
                        .iter()
                        .map(|point| point.precipitation_probability)
                        .fold(0.0, f64::max);
                }
            }

            let confidence = (confidence_score(temp_max.spread, MetricKind::Temperature)
                + confidence_score(precip_sum.spread, MetricKind::Precipitation)
                + confidence_score(wind_max.spread, MetricKind::WindSpeed))
                / 3.0;

            let weather_code =
                resolve_weather_code(&daily_values(model_data, i, |d| &d.weather_code));

            daily.push(DailyPoint {
                date,
                temperature_max: round_to(temp_max.mean, 1),
                temperature_min: round_to(temp_min.mean, 1),
                precipitation_sum: round_to(precip_sum.mean, 1),
                precipitation_probability_max: round_to(precip_prob_max, 0),
                wind_speed_max: round_to(wind_max.mean, 1),
                weather_code,
                confidence: round_to(confidence, 0),
                sunrise: reference.daily.sunrise.get(i).cloned(),
                sunset: reference.daily.sunset.get(i).cloned(),
            });
        }

        daily
    }

    /// Side-by-side view of what each individual model predicts at one
    /// hour offset, with the ensemble values alongside.
    pub fn model_comparison(
        &self,
        model_data: &BTreeMap<String, ModelPayload>,
        hour_offset: usize,
        latitude: f64,
        longitude: f64,
    ) -> AppResult<ModelComparisonResponse> {
        let reference = self.reference(model_data)?;

        let hourly_times = &reference.hourly.time;
        if hour_offset >= hourly_times.len() {
            return Err(AppError::Validation {
                field: "hour_offset".to_string(),
                message: format!(
                    "hour_offset {} exceeds available forecast hours (0-{})",
                    hour_offset,
                    hourly_times.len().saturating_sub(1)
                ),
            });
        }

        let time = parse_time(&hourly_times[hour_offset])
            .ok_or_else(|| AppError::Internal("Unparseable forecast timestamp".to_string()))?;

        let temps = hourly_values(model_data, hour_offset, |h| &h.temperature_2m);
        let precips = hourly_values(model_data, hour_offset, |h| &h.precipitation);
        let winds = hourly_values(model_data, hour_offset, |h| &h.wind_speed_10m);

        let models = model_data
            .keys()
            .map(|model| ModelPrediction {
                model_name: model.clone(),
                temperature: temps.get(model).copied().flatten().unwrap_or(0.0),
                precipitation: precips.get(model).copied().flatten().unwrap_or(0.0),
                wind_speed: winds.get(model).copied().flatten().unwrap_or(0.0),
            })
            .collect();

        let ensemble = ModelPrediction {
            model_name: "ensemble".to_string(),
            temperature: round_to(weighted_average(&temps, &self.weights).mean, 1),
            precipitation: round_to(weighted_average(&precips, &self.weights).mean, 1),
            wind_speed: round_to(weighted_average(&winds, &self.weights).mean, 1),
        };

        Ok(ModelComparisonResponse {
            location: ForecastLocation {
                latitude,
                longitude,
                timezone: reference.timezone.clone().unwrap_or_else(|| "UTC".to_string()),
            },
            time,
            models,
            ensemble,
        })
    }
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
