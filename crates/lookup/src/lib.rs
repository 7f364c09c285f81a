//! Clients for the remote lookup services.
//!
//! Both clients are thin: one call per work item, no retries, no pacing.
//! Rate limiting and timeouts are enforced by the worker pool.

pub mod config;
pub mod geocode;
pub mod weather;

use async_trait::async_trait;
use enrich_core::{GeocodeRecord, Result, WeatherRecord, WeatherWorkItem};

pub use config::*;
pub use geocode::NominatimClient;
pub use weather::OpenMeteoClient;

/// Resolves an area name to coordinates.
#[async_trait]
pub trait GeocodeLookup: Send + Sync {
    /// `Ok(None)` when the service knows no such place. That is a valid
    /// answer, not an error.
    async fn geocode(&self, area: &str) -> Result<Option<GeocodeRecord>>;
}

/// Fetches a daily weather series for one area and window.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Days returned by the service within `item.window`. An empty vec means
    /// the service had no daily data for the window.
    async fn daily_weather(&self, item: &WeatherWorkItem) -> Result<Vec<WeatherRecord>>;
}
