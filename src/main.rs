//! Enrichment Engine
//!
//! One-shot enrichment run:
//! - Geocode every customer area not yet resolved
//! - Fetch daily weather for every (area, date) in the order range not yet resolved
//! - Rate-limited remote lookups, results upserted to ClickHouse, keys marked
//!   in the dedup cache

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};

use clickhouse_client::{ClickHouseClient, ClickHouseConfig, ClickHouseEntitySource, ClickHouseStore};
use dedup_cache::{CacheBackend, CacheConfig, MemoryDedupCache, Namespace, RedisDedupCache};
use enrich_core::DedupCache;
use lookup_client::{GeocodeConfig, NominatimClient, OpenMeteoClient, WeatherConfig};
use telemetry::{init_tracing_from_env, metrics};
use worker::{EnrichmentPipeline, GeocodeEnrichment, PoolConfig, WeatherEnrichment};

/// Application configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default)]
    clickhouse: ClickHouseConfig,

    #[serde(default)]
    cache: CacheConfig,

    #[serde(default)]
    geocode: GeocodeConfig,

    #[serde(default)]
    weather: WeatherConfig,

    #[serde(default)]
    pool: PoolConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Enrichment Engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        clickhouse = %config.clickhouse.url,
        database = %config.clickhouse.database,
        cache = ?config.cache.backend,
        workers = config.pool.workers,
        spacing_ms = config.pool.spacing_ms,
        "Loaded configuration"
    );

    let clickhouse = ClickHouseClient::new(config.clickhouse.clone())
        .context("Failed to create ClickHouse client")?;

    if clickhouse_client::health::check_connection(&clickhouse).await {
        info!("ClickHouse connection: healthy");
    } else {
        error!("ClickHouse connection: unhealthy");
    }

    let (geocode_cache, weather_cache) = build_caches(&config.cache).await?;

    let store = Arc::new(ClickHouseStore::new(clickhouse.clone()));
    let source = Arc::new(ClickHouseEntitySource::new(clickhouse.clone()));

    let geocoder = Arc::new(
        NominatimClient::new(config.geocode.clone()).context("Failed to create geocode client")?,
    );
    let weather_client = Arc::new(
        OpenMeteoClient::new(config.weather.clone()).context("Failed to create weather client")?,
    );

    let geocode = GeocodeEnrichment::new(source.clone(), store.clone(), geocode_cache, geocoder)
        .with_pool(config.pool.clone())
        .with_call_timeout(config.geocode.timeout());

    let weather = WeatherEnrichment::new(source, store, weather_cache, weather_client)
        .with_pool(config.pool.clone())
        .with_call_timeout(config.weather.timeout())
        .with_chunk_days(config.weather.chunk_days);

    let outcome = EnrichmentPipeline::new(geocode, weather).run().await;

    metrics().snapshot().log();

    if !outcome.is_success() {
        let failed: Vec<&str> = outcome.setup_failures.iter().map(|f| f.flow).collect();
        bail!("Enrichment setup failed for: {}", failed.join(", "));
    }

    info!("Enrichment run complete");
    Ok(())
}

/// Build the geocode and weather dedup caches.
async fn build_caches(cfg: &CacheConfig) -> Result<(Arc<dyn DedupCache>, Arc<dyn DedupCache>)> {
    match cfg.backend {
        CacheBackend::Redis => {
            let redis = RedisDedupCache::connect(cfg)
                .await
                .context("Failed to connect to Redis")?;
            if let Err(e) = redis.ping().await {
                warn!("Redis ping failed: {}", e);
            }
            let weather = redis.namespace(Namespace::Weather);
            Ok((Arc::new(redis), Arc::new(weather)))
        }
        CacheBackend::Memory => {
            warn!("Using in-process dedup cache; every key is confirmed against the store");
            Ok((
                Arc::new(MemoryDedupCache::new()),
                Arc::new(MemoryDedupCache::new()),
            ))
        }
    }
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("ENRICH")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Flat overrides for nested fields; nested parsing trips on underscored names
    if let Ok(url) = std::env::var("ENRICH_CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("ENRICH_CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("ENRICH_CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("ENRICH_CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }

    if let Ok(url) = std::env::var("ENRICH_REDIS_URL") {
        config.cache.url = url;
    }
    if let Ok(prefix) = std::env::var("ENRICH_REDIS_KEY") {
        config.cache.key_prefix = prefix;
    }

    if let Ok(url) = std::env::var("ENRICH_GEOCODE_URL") {
        config.geocode.url = url;
    }
    if let Ok(url) = std::env::var("ENRICH_WEATHER_ARCHIVE_URL") {
        config.weather.archive_url = url;
    }
    if let Ok(url) = std::env::var("ENRICH_WEATHER_FORECAST_URL") {
        config.weather.forecast_url = url;
    }
    if let Ok(agent) = std::env::var("ENRICH_USER_AGENT") {
        config.geocode.user_agent = agent.clone();
        config.weather.user_agent = agent;
    }

    if let Ok(workers) = std::env::var("ENRICH_POOL_WORKERS") {
        config.pool.workers = workers
            .parse()
            .context("ENRICH_POOL_WORKERS must be a positive integer")?;
    }

    Ok(config)
}
