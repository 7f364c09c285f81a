//! Remote lookup service configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_user_agent() -> String {
    concat!("enrichment-engine/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Geocoding (Nominatim search API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    /// Search endpoint
    #[serde(default = "default_geocode_url")]
    pub url: String,
    /// Identifying User-Agent; the public service rejects anonymous clients
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_geocode_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_geocode_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_geocode_timeout_secs() -> u64 {
    10
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            url: default_geocode_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocode_timeout_secs(),
        }
    }
}

impl GeocodeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Daily weather (Open-Meteo) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Endpoint serving dates before today
    #[serde(default = "default_archive_url")]
    pub archive_url: String,
    /// Endpoint serving today and later
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_weather_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum days per request
    #[serde(default = "default_chunk_days")]
    pub chunk_days: u32,
}

fn default_archive_url() -> String {
    "https://archive-api.open-meteo.com/v1/archive".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_weather_timeout_secs() -> u64 {
    15
}

fn default_chunk_days() -> u32 {
    enrich_core::DEFAULT_CHUNK_DAYS
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            archive_url: default_archive_url(),
            forecast_url: default_forecast_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_weather_timeout_secs(),
            chunk_days: default_chunk_days(),
        }
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
