//! Geocode enrichment: resolve every customer area to coordinates, once.

use async_trait::async_trait;
use enrich_core::{
    AreaKey, DedupCache, EntitySource, GeocodeRecord, GeocodeWorkItem, RecordStore, Result,
};
use lookup_client::GeocodeLookup;
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::{error, info, warn};

use crate::pool::{FetchJob, PoolConfig, WorkerPool};
use crate::reconcile::{persist, resolve, Resolution};
use crate::report::EnrichmentReport;

const FLOW: &str = "geocode";

/// Pool job issuing one geocode call per area.
pub struct GeocodeJob {
    lookup: Arc<dyn GeocodeLookup>,
}

#[async_trait]
impl FetchJob for GeocodeJob {
    type Item = GeocodeWorkItem;
    type Output = Option<GeocodeRecord>;

    async fn fetch(&self, item: &GeocodeWorkItem) -> Result<Option<GeocodeRecord>> {
        self.lookup.geocode(&item.area).await
    }
}

/// Orchestrates one geocode run over the customer areas.
pub struct GeocodeEnrichment {
    source: Arc<dyn EntitySource>,
    store: Arc<dyn RecordStore<GeocodeRecord>>,
    cache: Arc<dyn DedupCache>,
    lookup: Arc<dyn GeocodeLookup>,
    pool: PoolConfig,
    call_timeout: Duration,
}

impl GeocodeEnrichment {
    pub fn new(
        source: Arc<dyn EntitySource>,
        store: Arc<dyn RecordStore<GeocodeRecord>>,
        cache: Arc<dyn DedupCache>,
        lookup: Arc<dyn GeocodeLookup>,
    ) -> Self {
        Self {
            source,
            store,
            cache,
            lookup,
            pool: PoolConfig::default(),
            call_timeout: Duration::from_secs(10),
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

    /// Run once to completion.
    ///
    /// Returns `Err` only when the schema cannot be ensured. Everything after
    /// that is per-key: failures are logged, counted and dropped.
    pub async fn run(&self) -> Result<EnrichmentReport> {
        self.store.ensure_schema().await?;

        let areas = match self.source.areas().await {
            Ok(areas) => areas,
            Err(e) => {
                error!(error = %e, "Failed to load areas");
                let report = EnrichmentReport::aborted(FLOW, e.to_string());
                report.log();
                return Ok(report);
            }
        };

        let mut report = EnrichmentReport::new(FLOW);
        report.universe = areas.len();

        let mut missing = Vec::new();
        for area in areas {
            let key = AreaKey::new(area.clone());
            match resolve::<GeocodeRecord, _>(&*self.cache, &*self.store, &key).await {
                Resolution::Cached => report.cached += 1,
                Resolution::Stored => report.already_stored += 1,
                Resolution::Missing => missing.push(GeocodeWorkItem { area }),
            }
        }

        if missing.is_empty() {
            info!(areas = report.universe, "All areas already geocoded");
            report.log();
            return Ok(report);
        }

        info!(missing = missing.len(), "Geocoding missing areas");
        report.dispatched = missing.len();

        let job = Arc::new(GeocodeJob {
            lookup: self.lookup.clone(),
        });
        let pool = WorkerPool::new(job, self.pool.clone(), self.call_timeout);
        let mut completions = pool.dispatch(missing);

        while let Some(completion) = completions.recv().await {
            let area = completion.item.area;
            match completion.outcome {
                Ok(Some(record)) => {
                    metrics().lookups_succeeded.inc();
                    if persist(&*self.cache, &*self.store, &record).await {
                        info!(
                            area = %area,
                            latitude = record.latitude,
                            longitude = record.longitude,
                            "Area geocoded"
                        );
                        report.stored += 1;
                    } else {
                        report.store_errors += 1;
                    }
                }
                Ok(None) => {
                    metrics().lookups_empty.inc();
                    warn!(area = %area, "No geocode result");
                    report.empty += 1;
                }
                Err(e) => {
                    metrics().lookups_failed.inc();
                    error!(area = %area, kind = e.kind(), error = %e, "Geocode lookup failed");
                    report.failed += 1;
                }
            }
        }

        report.log();
        Ok(report)
    }
}
