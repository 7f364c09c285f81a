//! Persistent store for resolved records.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use clickhouse::Row;
use enrich_core::{
    AreaDateKey, AreaKey, DateWindow, Error, GeocodeRecord, RecordStore, Result, WeatherRecord,
    WeatherStore, DATE_FORMAT,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use telemetry::metrics;
use tracing::debug;

use crate::client::ClickHouseClient;
use crate::schema::{ensure_geocode_schema, ensure_weather_schema};

/// Geocode row as stored.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct GeocodeRow {
    pub area: String,
    pub latitude: f64,
    pub longitude: f64,
    pub resolved_at: u64,
}

/// Weather row as stored. `date` is ClickHouse `Date`: days since 1970-01-01.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct WeatherRow {
    pub area: String,
    pub date: u16,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub resolved_at: u64,
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Convert to the ClickHouse `Date` wire representation.
pub fn date_to_days(date: NaiveDate) -> Result<u16> {
    let days = (date - epoch()).num_days();
    u16::try_from(days).map_err(|_| Error::database(format!("date {} outside ClickHouse Date range", date)))
}

pub fn days_to_date(days: u16) -> NaiveDate {
    epoch() + chrono::Duration::days(i64::from(days))
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// ClickHouse-backed store for both record types.
#[derive(Clone)]
pub struct ClickHouseStore {
    client: ClickHouseClient,
}

impl ClickHouseStore {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ClickHouseClient {
        &self.client
    }

    async fn write_row<T>(&self, table: &str, row: &T) -> Result<()>
    where
        T: Row + Serialize,
    {
        self.write_rows(table, std::slice::from_ref(row)).await
    }

    /// Write `rows` through a single INSERT, so one batch is one data part.
    async fn write_rows<T>(&self, table: &str, rows: &[T]) -> Result<()>
    where
        T: Row + Serialize,
    {
        if rows.is_empty() {
            return Ok(());
        }

        let start = Instant::now();

        let mut insert = self
            .client
            .inner()
            .insert(table)
            .map_err(|e| Error::database(format!("Insert error: {}", e)))?;
        for row in rows {
            insert
                .write(row)
                .await
                .map_err(|e| Error::database(format!("Write error: {}", e)))?;
        }
        insert
            .end()
            .await
            .map_err(|e| Error::database(format!("End error: {}", e)))?;

        metrics()
            .store_latency_ms
            .observe(start.elapsed().as_millis() as u64);
        Ok(())
    }
}

fn weather_row(record: &WeatherRecord, resolved_at: u64) -> Result<WeatherRow> {
    Ok(WeatherRow {
        area: record.area.clone(),
        date: date_to_days(record.date)?,
        temperature: record.temperature,
        precipitation: record.precipitation,
        resolved_at,
    })
}

#[async_trait]
impl RecordStore<GeocodeRecord> for ClickHouseStore {
    async fn ensure_schema(&self) -> Result<()> {
        ensure_geocode_schema(&self.client).await
    }

    async fn exists(&self, key: &AreaKey) -> Result<bool> {
        let sql = format!(
            "SELECT count() FROM {} WHERE area = ?",
            self.client.geocode_table()
        );
        let count: u64 = self
            .client
            .inner()
            .query(&sql)
            .bind(key.as_str())
            .fetch_one()
            .await
            .map_err(|e| Error::database(format!("Query error: {}", e)))?;
        Ok(count > 0)
    }

    async fn upsert(&self, record: &GeocodeRecord) -> Result<()> {
        let row = GeocodeRow {
            area: record.area.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            resolved_at: now_ms(),
        };
        self.write_row(&self.client.geocode_table(), &row).await?;
        debug!(area = %record.area, "Upserted geocode");
        Ok(())
    }
}

#[async_trait]
impl RecordStore<WeatherRecord> for ClickHouseStore {
    async fn ensure_schema(&self) -> Result<()> {
        ensure_weather_schema(&self.client).await
    }

    async fn exists(&self, key: &AreaDateKey) -> Result<bool> {
        let sql = format!(
            "SELECT count() FROM {} WHERE area = ? AND date = toDate(?)",
            self.client.weather_table()
        );
        let count: u64 = self
            .client
            .inner()
            .query(&sql)
            .bind(key.area.as_str())
            .bind(key.date.format(DATE_FORMAT).to_string())
            .fetch_one()
            .await
            .map_err(|e| Error::database(format!("Query error: {}", e)))?;
        Ok(count > 0)
    }

    async fn upsert(&self, record: &WeatherRecord) -> Result<()> {
        let row = weather_row(record, now_ms())?;
        self.write_row(&self.client.weather_table(), &row).await?;
        debug!(area = %record.area, date = %record.date, "Upserted weather");
        Ok(())
    }
}

#[async_trait]
impl WeatherStore for ClickHouseStore {
    async fn upsert_many(&self, records: &[WeatherRecord]) -> Result<()> {
        let resolved_at = now_ms();
        let rows = records
            .iter()
            .map(|r| weather_row(r, resolved_at))
            .collect::<Result<Vec<_>>>()?;
        self.write_rows(&self.client.weather_table(), &rows).await?;
        debug!(rows = rows.len(), "Upserted weather batch");
        Ok(())
    }

    /// One query per window instead of one per day.
    async fn existing_dates(&self, area: &str, window: DateWindow) -> Result<HashSet<NaiveDate>> {
        let sql = format!(
            "SELECT DISTINCT toString(date) FROM {} WHERE area = ? AND date BETWEEN toDate(?) AND toDate(?)",
            self.client.weather_table()
        );
        let dates: Vec<String> = self
            .client
            .inner()
            .query(&sql)
            .bind(area)
            .bind(window.start.format(DATE_FORMAT).to_string())
            .bind(window.end.format(DATE_FORMAT).to_string())
            .fetch_all()
            .await
            .map_err(|e| Error::database(format!("Query error: {}", e)))?;

        dates
            .iter()
            .map(|d| {
                NaiveDate::parse_from_str(d, DATE_FORMAT)
                    .map_err(|e| Error::database(format!("Bad date '{}': {}", d, e)))
            })
            .collect()
    }
}
