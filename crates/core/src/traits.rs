//! Seams between the orchestrators and their backing services.
//!
//! Production implementations live in `dedup-cache` (Redis) and
//! `clickhouse-client`; the integration tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;

use crate::area::normalize_areas;
use crate::error::Result;
use crate::keys::AreaDateKey;
use crate::records::{GeocodeRecord, ResolvedRecord, WeatherRecord};
use crate::window::DateWindow;

/// Membership set of resolved keys within one namespace.
///
/// Presence is authoritative, absence is not: the store may hold keys the
/// cache has never seen (after a flush or a crash between upsert and mark).
#[async_trait]
pub trait DedupCache: Send + Sync {
    async fn contains(&self, key: &str) -> Result<bool>;

    /// Add `key`. Idempotent.
    async fn mark(&self, key: &str) -> Result<()>;

    /// Drop every key in this namespace. The cache is rebuilt from the store
    /// on the next run.
    async fn clear(&self) -> Result<()>;
}

/// Durable, upsertable storage for one record type.
#[async_trait]
pub trait RecordStore<R: ResolvedRecord>: Send + Sync {
    /// Create the backing table if absent. Safe to call on every run.
    async fn ensure_schema(&self) -> Result<()>;

    async fn exists(&self, key: &R::Key) -> Result<bool>;

    /// Insert, or replace the record already stored under the same key.
    async fn upsert(&self, record: &R) -> Result<()>;
}

/// Weather storage with batched existence checks and writes.
#[async_trait]
pub trait WeatherStore: RecordStore<WeatherRecord> {
    /// Upsert every record in one write. Either all rows land or the call
    /// fails.
    async fn upsert_many(&self, records: &[WeatherRecord]) -> Result<()> {
        for record in records {
            self.upsert(record).await?;
        }
        Ok(())
    }

    /// Dates within `window` already stored for `area`.
    async fn existing_dates(&self, area: &str, window: DateWindow) -> Result<HashSet<NaiveDate>> {
        let mut found = HashSet::new();
        for date in window.dates() {
            if self.exists(&AreaDateKey::new(area, date)).await? {
                found.insert(date);
            }
        }
        Ok(found)
    }
}

/// Upstream tables the entity universes are derived from.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Raw area values from the customer dimension, as stored.
    async fn raw_areas(&self) -> Result<Vec<String>>;

    /// Earliest and latest order date, or `None` when there are no orders.
    async fn order_date_range(&self) -> Result<Option<DateWindow>>;

    /// Areas that already have coordinates.
    async fn geocoded_areas(&self) -> Result<Vec<GeocodeRecord>>;

    /// Trimmed, title-cased, deduplicated area names.
    async fn areas(&self) -> Result<Vec<String>> {
        Ok(normalize_areas(self.raw_areas().await?))
    }
}
