//! Local stand-in for the geocoding and weather HTTP services.
//!
//! Serves Nominatim-shaped `/search` and Open-Meteo-shaped `/v1/archive`
//! and `/v1/forecast` on an ephemeral port, so the real HTTP clients can be
//! tested without network access. Special area names trigger failure modes.

use axum::{
    extract::{Query, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use lookup_client::{GeocodeConfig, WeatherConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::fixtures;

/// Area that resolves to nothing.
pub const UNKNOWN_AREA: &str = "Atlantis";
/// Area answered with HTTP 500.
pub const BROKEN_AREA: &str = "Broken Zone";
/// Area answered with a non-JSON body.
pub const GARBLED_AREA: &str = "Garbled Zone";
/// Area answered after [`SLOW_DELAY`].
pub const SLOW_AREA: &str = "Slow Zone";
pub const SLOW_DELAY: Duration = Duration::from_secs(3);
/// Latitude for which weather endpoints return no `daily` series.
pub const NO_DATA_LATITUDE: &str = "0";

/// One request seen by the fake server.
#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub params: HashMap<String, String>,
    pub user_agent: Option<String>,
}

#[derive(Clone, Default)]
struct FakeState {
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl FakeState {
    fn record(&self, path: &str, headers: &HeaderMap, params: &HashMap<String, String>) {
        self.hits.lock().push(Hit {
            path: path.to_string(),
            params: params.clone(),
            user_agent: headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });
    }
}

/// Running fake lookup server.
pub struct FakeLookupApi {
    pub base_url: String,
    state: FakeState,
}

impl FakeLookupApi {
    pub async fn start() -> Self {
        let state = FakeState::default();
        let app = Router::new()
            .route("/search", get(search))
            .route("/v1/archive", get(archive))
            .route("/v1/forecast", get(forecast))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake lookup API");
        let addr = listener.local_addr().expect("bound address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn geocode_config(&self) -> GeocodeConfig {
        GeocodeConfig {
            url: format!("{}/search", self.base_url),
            user_agent: "enrichment-engine-tests".to_string(),
            timeout_secs: 1,
        }
    }

    pub fn weather_config(&self) -> WeatherConfig {
        WeatherConfig {
            archive_url: format!("{}/v1/archive", self.base_url),
            forecast_url: format!("{}/v1/forecast", self.base_url),
            user_agent: "enrichment-engine-tests".to_string(),
            ..WeatherConfig::default()
        }
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.hits.lock().clone()
    }

    pub fn hits_on(&self, path: &str) -> Vec<Hit> {
        self.hits().into_iter().filter(|h| h.path == path).collect()
    }
}

async fn search(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record("/search", &headers, &params);

    let area = params.get("q").cloned().unwrap_or_default();
    match area.as_str() {
        UNKNOWN_AREA => Json(serde_json::json!([])).into_response(),
        BROKEN_AREA => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        GARBLED_AREA => (StatusCode::OK, "<html>rate limited</html>").into_response(),
        SLOW_AREA => {
            tokio::time::sleep(SLOW_DELAY).await;
            Json(serde_json::json!([])).into_response()
        }
        _ => Json(fixtures::nominatim_body(12.9, 77.6)).into_response(),
    }
}

async fn archive(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record("/v1/archive", &headers, &params);
    daily(&params)
}

async fn forecast(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record("/v1/forecast", &headers, &params);
    daily(&params)
}

fn daily(params: &HashMap<String, String>) -> Response {
    if params.get("latitude").map(String::as_str) == Some(NO_DATA_LATITUDE) {
        return Json(serde_json::json!({"reason": "No data is available for this location"}))
            .into_response();
    }

    let parse = |name: &str| {
        params
            .get(name)
            .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
    };
    match (parse("start_date"), parse("end_date")) {
        (Some(start), Some(end)) => Json(fixtures::open_meteo_body(start, end)).into_response(),
        _ => (StatusCode::BAD_REQUEST, "missing start_date/end_date").into_response(),
    }
}
