//! Read-back queries (used in tests and admin).

use crate::client::ClickHouseClient;
use crate::store::{days_to_date, GeocodeRow, WeatherRow};
use enrich_core::{Error, GeocodeRecord, Result, WeatherRecord};

/// Count distinct areas with stored coordinates.
pub async fn count_geocodes(client: &ClickHouseClient) -> Result<u64> {
    let sql = format!("SELECT count() FROM {} FINAL", client.geocode_table());
    client
        .inner()
        .query(&sql)
        .fetch_one()
        .await
        .map_err(|e| Error::database(format!("Query error: {}", e)))
}

/// Count distinct (area, date) weather rows.
pub async fn count_weather_days(client: &ClickHouseClient) -> Result<u64> {
    let sql = format!("SELECT count() FROM {} FINAL", client.weather_table());
    client
        .inner()
        .query(&sql)
        .fetch_one()
        .await
        .map_err(|e| Error::database(format!("Query error: {}", e)))
}

/// Fetch the current geocode for an area.
pub async fn query_geocode(client: &ClickHouseClient, area: &str) -> Result<Option<GeocodeRecord>> {
    let sql = format!(
        "SELECT ?fields FROM {} FINAL WHERE area = ?",
        client.geocode_table()
    );
    let rows: Vec<GeocodeRow> = client
        .inner()
        .query(&sql)
        .bind(area)
        .fetch_all()
        .await
        .map_err(|e| Error::database(format!("Query error: {}", e)))?;

    Ok(rows.into_iter().next().map(|r| GeocodeRecord {
        area: r.area,
        latitude: r.latitude,
        longitude: r.longitude,
    }))
}

/// Fetch stored weather for an area, oldest day first.
pub async fn query_weather(client: &ClickHouseClient, area: &str) -> Result<Vec<WeatherRecord>> {
    let sql = format!(
        "SELECT ?fields FROM {} FINAL WHERE area = ? ORDER BY date",
        client.weather_table()
    );
    let rows: Vec<WeatherRow> = client
        .inner()
        .query(&sql)
        .bind(area)
        .fetch_all()
        .await
        .map_err(|e| Error::database(format!("Query error: {}", e)))?;

    Ok(rows
        .into_iter()
        .map(|r| WeatherRecord {
            area: r.area,
            date: days_to_date(r.date),
            temperature: r.temperature,
            precipitation: r.precipitation,
        })
        .collect())
}

/// Truncate both result tables (test cleanup).
pub async fn truncate_results(client: &ClickHouseClient) -> Result<()> {
    for table in [client.geocode_table(), client.weather_table()] {
        client
            .inner()
            .query(&format!("TRUNCATE TABLE IF EXISTS {}", table))
            .execute()
            .await
            .map_err(|e| Error::database(format!("Truncate error: {}", e)))?;
    }
    Ok(())
}
