//! Configuration management for the Weather Ensemble Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with WX_ prefix

use std::collections::HashMap;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Ensemble model configuration
    pub ensemble: EnsembleConfig,

    /// Accuracy verification configuration
    pub accuracy: AccuracyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

/// Which Open-Meteo models feed the ensemble and how they are weighted.
#[derive(Debug, Deserialize, Clone)]
pub struct EnsembleConfig {
    /// Open-Meteo forecast API base URL
    pub base_url: String,

    /// Models to fetch, in reference-model preference order
    pub models: Vec<String>,

    /// Per-model weights for the ensemble mean; unlisted models weigh 1.0
    pub weights: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccuracyConfig {
    /// Tolerance for matching a forecast target time to an observation time
    pub match_tolerance_secs: i64,

    /// How many trailing days of observations an ingestion run fetches
    pub observation_backfill_days: i64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("WX_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("ensemble.base_url", "https://api.open-meteo.com/v1")?
            .set_default(
                "ensemble.models",
                vec![
                    "gfs_seamless",         // GFS (NOAA)
                    "ecmwf_ifs04",          // ECMWF
                    "icon_seamless",        // ICON (DWD)
                    "gem_seamless",         // GEM (Canada)
                    "jma_seamless",         // JMA (Japan)
                    "meteofrance_seamless", // Meteo-France
                ],
            )?
            .set_default("ensemble.weights.gfs_seamless", 1.0)?
            // ECMWF is typically the most accurate model globally
            .set_default("ensemble.weights.ecmwf_ifs04", 1.2)?
            .set_default("ensemble.weights.icon_seamless", 1.0)?
            .set_default("ensemble.weights.gem_seamless", 0.9)?
            .set_default("ensemble.weights.jma_seamless", 0.9)?
            .set_default("ensemble.weights.meteofrance_seamless", 1.0)?
            .set_default("accuracy.match_tolerance_secs", 3600)?
            .set_default("accuracy.observation_backfill_days", 7)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WX_ prefix)
            .add_source(
                Environment::with_prefix("WX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}
