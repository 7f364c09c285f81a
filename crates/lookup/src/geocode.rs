//! Nominatim-style geocoding client.

use async_trait::async_trait;
use enrich_core::{Error, GeocodeRecord, Result};
use reqwest::header::{ACCEPT_LANGUAGE, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::GeocodeConfig;
use crate::GeocodeLookup;

/// One search hit. Coordinates arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Geocoding client for a Nominatim-compatible search API.
#[derive(Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    config: GeocodeConfig,
}

impl NominatimClient {
    pub fn new(config: GeocodeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build geocode HTTP client: {}", e)))?;

        info!(url = %config.url, timeout_secs = config.timeout_secs, "Created geocode client");
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeocodeConfig {
        &self.config
    }
}

/// Map a reqwest failure onto the lookup taxonomy.
pub(crate) fn transport_error(e: reqwest::Error, timeout: Duration) -> Error {
    if e.is_timeout() {
        Error::Timeout(timeout)
    } else {
        Error::transport(e.to_string())
    }
}

/// Parse a search response body. An empty array means "no such place".
pub fn parse_geocode(area: &str, body: &str) -> Result<Option<GeocodeRecord>> {
    let places: Vec<Place> = serde_json::from_str(body)
        .map_err(|e| Error::decode(format!("geocode response for '{}': {}", area, e)))?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let latitude: f64 = place
        .lat
        .trim()
        .parse()
        .map_err(|_| Error::decode(format!("bad latitude '{}' for '{}'", place.lat, area)))?;
    let longitude: f64 = place
        .lon
        .trim()
        .parse()
        .map_err(|_| Error::decode(format!("bad longitude '{}' for '{}'", place.lon, area)))?;

    Ok(Some(GeocodeRecord {
        area: area.to_string(),
        latitude,
        longitude,
    }))
}

#[async_trait]
impl GeocodeLookup for NominatimClient {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn geocode(&self, area: &str) -> Result<Option<GeocodeRecord>> {
        let response = self
            .http
            .get(&self.config.url)
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT_LANGUAGE, "en")
            .query(&[("q", area), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.config.timeout()))?;
        debug!(area = area, bytes = body.len(), "Geocode response received");

        parse_geocode(area, &body)
    }
}
