//! Weather enrichment: daily weather per geocoded area across the order
//! date range.
//!
//! Resolution is per (area, date). Only dates the store lacks are requested,
//! grouped into contiguous runs, split at today (archive vs. forecast) and
//! chunked to the service's maximum window.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use enrich_core::{
    contiguous_runs, AreaDateKey, DateWindow, DedupCache, EntityKey, EntitySource, GeocodeRecord,
    Result, WeatherRecord, WeatherStore, WeatherWorkItem, DEFAULT_CHUNK_DAYS,
};
use lookup_client::WeatherLookup;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::{debug, error, info, warn};

use crate::pool::{FetchJob, PoolConfig, WorkerPool};
use crate::reconcile::{cache_contains, cache_mark, persist_batch};
use crate::report::EnrichmentReport;

const FLOW: &str = "weather";

/// Pool job issuing one weather call per (area, window) item.
pub struct WeatherJob {
    lookup: Arc<dyn WeatherLookup>,
}

#[async_trait]
impl FetchJob for WeatherJob {
    type Item = WeatherWorkItem;
    type Output = Vec<WeatherRecord>;

    async fn fetch(&self, item: &WeatherWorkItem) -> Result<Vec<WeatherRecord>> {
        self.lookup.daily_weather(item).await
    }
}

/// Orchestrates one weather run.
pub struct WeatherEnrichment {
    source: Arc<dyn EntitySource>,
    store: Arc<dyn WeatherStore>,
    cache: Arc<dyn DedupCache>,
    lookup: Arc<dyn WeatherLookup>,
    pool: PoolConfig,
    call_timeout: Duration,
    chunk_days: u32,
    today: Option<NaiveDate>,
}

impl WeatherEnrichment {
    pub fn new(
        source: Arc<dyn EntitySource>,
        store: Arc<dyn WeatherStore>,
        cache: Arc<dyn DedupCache>,
        lookup: Arc<dyn WeatherLookup>,
    ) -> Self {
        Self {
            source,
            store,
            cache,
            lookup,
            pool: PoolConfig::default(),
            call_timeout: Duration::from_secs(15),
            chunk_days: DEFAULT_CHUNK_DAYS,
            today: None,
        }
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_chunk_days(mut self, chunk_days: u32) -> Self {
        self.chunk_days = chunk_days.max(1);
        self
    }

    /// Pin the date that separates archive from forecast requests.
    /// Defaults to the local calendar date at the start of each run.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Run once to completion. See [`crate::GeocodeEnrichment::run`] for the
    /// error contract.
    pub async fn run(&self) -> Result<EnrichmentReport> {
        self.store.ensure_schema().await?;

        let range = match self.source.order_date_range().await {
            Ok(Some(range)) => range,
            Ok(None) => {
                info!("No orders, nothing to enrich");
                let report = EnrichmentReport::new(FLOW);
                report.log();
                return Ok(report);
            }
            Err(e) => {
                error!(error = %e, "Failed to load order date range");
                let report = EnrichmentReport::aborted(FLOW, e.to_string());
                report.log();
                return Ok(report);
            }
        };

        let areas = match self.source.geocoded_areas().await {
            Ok(areas) => areas,
            Err(e) => {
                error!(error = %e, "Failed to load geocoded areas");
                let report = EnrichmentReport::aborted(FLOW, e.to_string());
                report.log();
                return Ok(report);
            }
        };

        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        info!(
            range = %range,
            areas = areas.len(),
            today = %today,
            "Computing missing weather days"
        );

        let mut report = EnrichmentReport::new(FLOW);
        let mut items = Vec::new();
        for area in &areas {
            report.universe += range.len_days() as usize;
            let missing = self.missing_dates(area, range, &mut report).await;
            items.extend(self.plan(area, &missing, today));
        }

        if items.is_empty() {
            info!(keys = report.universe, "All weather days already resolved");
            report.log();
            return Ok(report);
        }

        info!(requests = items.len(), "Fetching missing weather windows");
        report.dispatched = items.len();

        let job = Arc::new(WeatherJob {
            lookup: self.lookup.clone(),
        });
        let pool = WorkerPool::new(job, self.pool.clone(), self.call_timeout);
        let mut completions = pool.dispatch(items);

        while let Some(completion) = completions.recv().await {
            let item = completion.item;
            match completion.outcome {
                Ok(records) if records.is_empty() => {
                    metrics().lookups_empty.inc();
                    warn!(area = %item.area, window = %item.window, "No weather data returned");
                    report.empty += 1;
                }
                Ok(records) => {
                    metrics().lookups_succeeded.inc();
                    let stored = persist_batch(&*self.cache, &*self.store, &records).await;
                    report.store_errors += records.len() - stored;
                    info!(
                        area = %item.area,
                        window = %item.window,
                        horizon = item.horizon.as_str(),
                        days = stored,
                        "Weather stored"
                    );
                    report.stored += stored;
                }
                Err(e) => {
                    metrics().lookups_failed.inc();
                    error!(
                        area = %item.area,
                        window = %item.window,
                        kind = e.kind(),
                        error = %e,
                        "Weather lookup failed"
                    );
                    report.failed += 1;
                }
            }
        }

        report.log();
        Ok(report)
    }

    /// Dates in `range` with no stored record for `area`. The store is read
    /// once for the whole range. A cached date counts only if the store has
    /// it; store hits without a cache mark are marked back.
    async fn missing_dates(
        &self,
        area: &GeocodeRecord,
        range: DateWindow,
        report: &mut EnrichmentReport,
    ) -> Vec<NaiveDate> {
        let stored: HashSet<NaiveDate> = match self.store.existing_dates(&area.area, range).await {
            Ok(found) => found,
            Err(e) => {
                warn!(area = %area.area, error = %e, "Store check failed, treating days as missing");
                HashSet::new()
            }
        };

        let mut missing = Vec::new();
        let mut stale = 0;
        for date in range.dates() {
            let key = AreaDateKey::new(area.area.as_str(), date).cache_key();
            let cached = cache_contains(&*self.cache, &key).await;

            match (stored.contains(&date), cached) {
                (true, true) => {
                    metrics().cache_hits.inc();
                    report.cached += 1;
                }
                (true, false) => {
                    metrics().store_hits.inc();
                    report.already_stored += 1;
                    cache_mark(&*self.cache, &key).await;
                }
                (false, cached) => {
                    if cached {
                        metrics().cache_stale.inc();
                        stale += 1;
                    }
                    missing.push(date);
                }
            }
        }

        if stale > 0 {
            warn!(area = %area.area, days = stale, "Stale cache entries, days missing from store");
        }
        debug!(area = %area.area, missing = missing.len(), "Missing weather days");
        missing
    }

    /// Work items covering `missing`: one per contiguous run, split at today
    /// and chunked.
    fn plan(&self, area: &GeocodeRecord, missing: &[NaiveDate], today: NaiveDate) -> Vec<WeatherWorkItem> {
        let mut items = Vec::new();
        for run in contiguous_runs(missing) {
            for (_, window) in run.dispatch_plan(today, self.chunk_days) {
                match WeatherWorkItem::new(
                    area.area.as_str(),
                    area.latitude,
                    area.longitude,
                    window,
                    today,
                ) {
                    Ok(item) => items.push(item),
                    Err(e) => error!(area = %area.area, window = %window, error = %e, "Unplannable window"),
                }
            }
        }
        items
    }
}
