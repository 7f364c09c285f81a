//! Cache and store bookkeeping shared by both orchestrators.
//!
//! Write order is always upsert, then mark. A key is marked only once its
//! record is durably stored, so a crash in between leaves the key
//! "stored but unmarked", which the next run repairs via the store check.

use enrich_core::{DedupCache, EntityKey, RecordStore, ResolvedRecord, WeatherRecord, WeatherStore};
use telemetry::metrics;
use tracing::{debug, error, warn};

/// Where a key's resolution was found, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Cached,
    Stored,
    Missing,
}

/// Cache lookup. Cache errors count as a miss.
pub(crate) async fn cache_contains(cache: &dyn DedupCache, key: &str) -> bool {
    match cache.contains(key).await {
        Ok(hit) => hit,
        Err(e) => {
            metrics().cache_errors.inc();
            warn!(key = key, error = %e, "Cache lookup failed, treating as miss");
            false
        }
    }
}

/// Add a key to the cache. Failure only costs a store check next run.
pub(crate) async fn cache_mark(cache: &dyn DedupCache, key: &str) {
    if let Err(e) = cache.mark(key).await {
        metrics().cache_errors.inc();
        warn!(key = key, error = %e, "Failed to mark key in cache");
    }
}

/// Resolve one key against the store. A cache mark only counts once the
/// store confirms the record; a mark without a row is stale and the key is
/// fetched again. A store hit without a mark re-marks the cache.
pub(crate) async fn resolve<R, S>(
    cache: &dyn DedupCache,
    store: &S,
    key: &R::Key,
) -> Resolution
where
    R: ResolvedRecord,
    S: RecordStore<R> + ?Sized,
{
    let cache_key = key.cache_key();
    let cached = cache_contains(cache, &cache_key).await;

    match store.exists(key).await {
        Ok(true) if cached => {
            metrics().cache_hits.inc();
            Resolution::Cached
        }
        Ok(true) => {
            metrics().store_hits.inc();
            debug!(key = %cache_key, "Found in store, repairing cache");
            cache_mark(cache, &cache_key).await;
            Resolution::Stored
        }
        Ok(false) => {
            if cached {
                metrics().cache_stale.inc();
                warn!(key = %cache_key, "Stale cache entry, record missing from store");
            }
            Resolution::Missing
        }
        Err(e) => {
            // Re-fetching is safe: the upsert replaces.
            warn!(key = %cache_key, error = %e, "Store check failed, treating as missing");
            Resolution::Missing
        }
    }
}

/// Upsert a resolved record, then mark its key. Returns whether it was stored.
pub(crate) async fn persist<R, S>(cache: &dyn DedupCache, store: &S, record: &R) -> bool
where
    R: ResolvedRecord,
    S: RecordStore<R> + ?Sized,
{
    let cache_key = record.key().cache_key();

    if let Err(e) = store.upsert(record).await {
        metrics().store_errors.inc();
        error!(key = %cache_key, error = %e, "Upsert failed, key left unmarked");
        return false;
    }

    metrics().records_stored.inc();
    cache_mark(cache, &cache_key).await;
    true
}

/// Upsert one batch of weather days in a single write, then mark every key.
/// A rejected batch leaves all of its keys unmarked. Returns the number
/// stored.
pub(crate) async fn persist_batch<S>(
    cache: &dyn DedupCache,
    store: &S,
    records: &[WeatherRecord],
) -> usize
where
    S: WeatherStore + ?Sized,
{
    if records.is_empty() {
        return 0;
    }

    if let Err(e) = store.upsert_many(records).await {
        metrics().store_errors.inc_by(records.len() as u64);
        error!(
            area = %records[0].area,
            days = records.len(),
            error = %e,
            "Batch upsert failed, keys left unmarked"
        );
        return 0;
    }

    metrics().records_stored.inc_by(records.len() as u64);
    for record in records {
        cache_mark(cache, &record.key().cache_key()).await;
    }
    records.len()
}
