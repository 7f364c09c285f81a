//! ClickHouse table schemas.
//!
//! Both result tables use `ReplacingMergeTree(resolved_at)` ordered by the
//! entity key: a re-upsert of the same key replaces the older row at merge
//! time, and reads that need one row per key use `FINAL`. Inserts for
//! different keys never collide.

use crate::client::ClickHouseClient;
use enrich_core::{Error, Result};
use tracing::debug;

/// SQL for creating the database.
pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", database)
}

/// SQL for the geocode table (one row per area).
pub fn create_geocode_table(qualified: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {} (
    area String,
    latitude Float64,
    longitude Float64,

    -- Resolution time in ms; the newest row per area wins
    resolved_at UInt64
)
ENGINE = ReplacingMergeTree(resolved_at)
ORDER BY area
"#,
        qualified
    )
}

/// SQL for the daily weather table (one row per area and day).
pub fn create_weather_table(qualified: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {} (
    area String,
    date Date,
    temperature Nullable(Float64),
    precipitation Nullable(Float64),

    -- Resolution time in ms; the newest row per (area, date) wins
    resolved_at UInt64
)
ENGINE = ReplacingMergeTree(resolved_at)
PARTITION BY toYear(date)
ORDER BY (area, date)
"#,
        qualified
    )
}

async fn execute(client: &ClickHouseClient, sql: &str) -> Result<()> {
    client
        .inner()
        .query(sql)
        .execute()
        .await
        .map_err(|e| Error::database(format!("Schema init error: {}", e)))
}

/// Create the database and geocode table if absent.
pub async fn ensure_geocode_schema(client: &ClickHouseClient) -> Result<()> {
    execute(client, &create_database(&client.config().database)).await?;
    execute(client, &create_geocode_table(&client.geocode_table())).await?;
    debug!(table = %client.geocode_table(), "Geocode table ensured");
    Ok(())
}

/// Create the database and weather table if absent.
pub async fn ensure_weather_schema(client: &ClickHouseClient) -> Result<()> {
    execute(client, &create_database(&client.config().database)).await?;
    execute(client, &create_weather_table(&client.weather_table())).await?;
    debug!(table = %client.weather_table(), "Weather table ensured");
    Ok(())
}

/// Initialize the database schema.
///
/// Creates the database and both result tables if they don't exist.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    ensure_geocode_schema(client).await?;
    ensure_weather_schema(client).await
}
