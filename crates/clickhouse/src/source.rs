//! Upstream entity source: the tables the enrichment universes come from.

use async_trait::async_trait;
use chrono::NaiveDate;
use clickhouse::Row;
use enrich_core::{DateWindow, EntitySource, Error, GeocodeRecord, Result, DATE_FORMAT};
use serde::Deserialize;
use tracing::info;

use crate::client::ClickHouseClient;

#[derive(Debug, Row, Deserialize)]
struct DateRangeRow {
    min_date: Option<String>,
    max_date: Option<String>,
    dated_orders: u64,
}

#[derive(Debug, Row, Deserialize)]
struct GeocodeReadRow {
    area: String,
    latitude: f64,
    longitude: f64,
}

/// Reads areas, order dates and stored coordinates from ClickHouse.
#[derive(Clone)]
pub struct ClickHouseEntitySource {
    client: ClickHouseClient,
}

impl ClickHouseEntitySource {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| Error::source(format!("Bad order date '{}': {}", raw, e)))
}

#[async_trait]
impl EntitySource for ClickHouseEntitySource {
    async fn raw_areas(&self) -> Result<Vec<String>> {
        let table = self.client.customers_table();
        let sql = format!(
            "SELECT DISTINCT toString(assumeNotNull(area)) FROM {} WHERE area IS NOT NULL",
            table
        );
        let areas: Vec<String> = self
            .client
            .inner()
            .query(&sql)
            .fetch_all()
            .await
            .map_err(|e| Error::source(format!("{}.area: {}", table, e)))?;

        info!(table = %table, count = areas.len(), "Fetched distinct raw areas");
        Ok(areas)
    }

    async fn order_date_range(&self) -> Result<Option<DateWindow>> {
        let table = self.client.orders_table();
        // Unparseable dates become NULL and are ignored by min/max/count.
        let sql = format!(
            r#"
            SELECT
                toString(min(d)) AS min_date,
                toString(max(d)) AS max_date,
                count(d) AS dated_orders
            FROM (
                SELECT toDate(parseDateTimeBestEffortOrNull(toString(order_date))) AS d
                FROM {}
            )
            "#,
            table
        );
        let row: DateRangeRow = self
            .client
            .inner()
            .query(&sql)
            .fetch_one()
            .await
            .map_err(|e| Error::source(format!("{}.order_date: {}", table, e)))?;

        let (Some(min), Some(max)) = (row.min_date, row.max_date) else {
            return Ok(None);
        };
        if row.dated_orders == 0 {
            return Ok(None);
        }

        let window = DateWindow::new(parse_date(&min)?, parse_date(&max)?)?;
        info!(table = %table, window = %window, orders = row.dated_orders, "Fetched order date range");
        Ok(Some(window))
    }

    async fn geocoded_areas(&self) -> Result<Vec<GeocodeRecord>> {
        let table = self.client.geocode_table();
        let sql = format!("SELECT area, latitude, longitude FROM {} FINAL", table);
        let rows: Vec<GeocodeReadRow> = self
            .client
            .inner()
            .query(&sql)
            .fetch_all()
            .await
            .map_err(|e| Error::source(format!("{}: {}", table, e)))?;

        info!(table = %table, count = rows.len(), "Fetched geocoded areas");
        Ok(rows
            .into_iter()
            .map(|r| GeocodeRecord {
                area: r.area,
                latitude: r.latitude,
                longitude: r.longitude,
            })
            .collect())
    }
}
