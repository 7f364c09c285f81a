//! Open-Meteo-style daily weather client.
//!
//! Past dates are served by the archive endpoint and today onwards by the
//! forecast endpoint. Work items arrive already split, so each call goes to
//! exactly one endpoint.

use async_trait::async_trait;
use chrono::NaiveDate;
use enrich_core::{DateWindow, Error, Horizon, Result, WeatherRecord, WeatherWorkItem, DATE_FORMAT};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::WeatherConfig;
use crate::geocode::transport_error;
use crate::WeatherLookup;

/// Daily variables requested from the service.
pub const DAILY_VARIABLES: &str = "temperature_2m_max,precipitation_sum";

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    daily: Option<DailySeries>,
}

/// Parallel arrays, one entry per day.
#[derive(Debug, Deserialize)]
struct DailySeries {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

/// Daily weather client for an Open-Meteo-compatible API.
#[derive(Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    config: WeatherConfig,
}

impl OpenMeteoClient {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build weather HTTP client: {}", e)))?;

        info!(
            archive_url = %config.archive_url,
            forecast_url = %config.forecast_url,
            timeout_secs = config.timeout_secs,
            "Created weather client"
        );
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    /// Endpoint serving a window on the given side of today.
    pub fn endpoint(&self, horizon: Horizon) -> &str {
        match horizon {
            Horizon::Past => &self.config.archive_url,
            Horizon::Future => &self.config.forecast_url,
        }
    }
}

/// Parse a daily weather body, keeping only days inside `window`.
///
/// A body without a `daily` object yields no records.
pub fn parse_weather(area: &str, window: &DateWindow, body: &str) -> Result<Vec<WeatherRecord>> {
    let response: WeatherResponse = serde_json::from_str(body)
        .map_err(|e| Error::decode(format!("weather response for '{}': {}", area, e)))?;

    let Some(daily) = response.daily else {
        return Ok(Vec::new());
    };

    let mut records = Vec::with_capacity(daily.time.len());
    for (i, raw_date) in daily.time.iter().enumerate() {
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|e| Error::decode(format!("bad date '{}' for '{}': {}", raw_date, area, e)))?;

        if !window.contains(date) {
            continue;
        }

        records.push(WeatherRecord {
            area: area.to_string(),
            date,
            temperature: daily.temperature_2m_max.get(i).copied().flatten(),
            precipitation: daily.precipitation_sum.get(i).copied().flatten(),
        });
    }

    Ok(records)
}

#[async_trait]
impl WeatherLookup for OpenMeteoClient {
    #[tracing::instrument(level = "debug", skip(self, item), fields(area = %item.area, window = %item.window))]
    async fn daily_weather(&self, item: &WeatherWorkItem) -> Result<Vec<WeatherRecord>> {
        let url = self.endpoint(item.horizon);
        let start = item.window.start.format(DATE_FORMAT).to_string();
        let end = item.window.end.format(DATE_FORMAT).to_string();

        let response = self
            .http
            .get(url)
            .header(USER_AGENT, &self.config.user_agent)
            .query(&[
                ("latitude", item.latitude.to_string()),
                ("longitude", item.longitude.to_string()),
                ("start_date", start),
                ("end_date", end),
                ("daily", DAILY_VARIABLES.to_string()),
                ("timezone", "auto".to_string()),
            ])
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

        let records = parse_weather(&item.area, &item.window, &body)?;
        if records.is_empty() {
            warn!(area = %item.area, window = %item.window, "No daily weather in response");
        } else {
            debug!(
                area = %item.area,
                horizon = item.horizon.as_str(),
                days = records.len(),
                "Weather response parsed"
            );
        }
        Ok(records)
    }
}
