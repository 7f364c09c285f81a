//! Geocode enrichment against in-memory cache, store and geocoder.

use enrich_core::{AreaKey, DedupCache};
use integration_tests::{fixtures, mocks::MockGeocoder, setup::TestContext};

fn zone_geocoder() -> MockGeocoder {
    MockGeocoder::new()
        .with_place("North Zone", 28.7, 77.1)
        .with_place("South Zone", 12.9, 77.6)
        .with_place("East Zone", 22.5, 88.3)
        .with_place("West Zone", 19.0, 72.8)
}

/// Duplicate and differently-cased areas collapse; a cached area is skipped.
#[tokio::test]
async fn test_only_uncached_area_is_dispatched() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source.set_areas(fixtures::raw_zone_areas());
    ctx.geocodes.seed([fixtures::north_zone()]);
    ctx.geocode_cache.mark("North Zone").await.unwrap();

    let report = ctx.geocode_flow().run().await.unwrap();

    assert_eq!(report.universe, 2);
    assert_eq!(report.cached, 1);
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.stored, 1);
    assert_eq!(ctx.geocoder.calls(), vec!["South Zone"]);

    assert_eq!(ctx.geocodes.upsert_count(), 1);
    let stored = ctx.geocodes.get(&AreaKey::new("South Zone")).unwrap();
    assert_eq!((stored.latitude, stored.longitude), (12.9, 77.6));
    assert_eq!(ctx.geocode_cache.snapshot(), vec!["North Zone", "South Zone"]);
}

#[tokio::test]
async fn test_second_run_makes_no_calls() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source
        .set_areas(["North Zone", "South Zone", "East Zone", "West Zone"]);

    let first = ctx.geocode_flow().run().await.unwrap();
    assert_eq!(first.stored, 4);
    assert_eq!(ctx.geocoder.call_count(), 4);

    ctx.geocoder.reset_calls();
    let second = ctx.geocode_flow().run().await.unwrap();

    assert_eq!(ctx.geocoder.call_count(), 0);
    assert_eq!(second.cached, 4);
    assert_eq!(second.dispatched, 0);
    assert_eq!(ctx.geocodes.len(), 4);
    assert_eq!(ctx.geocodes.upsert_count(), 4);
}

#[tokio::test]
async fn test_one_failing_lookup_does_not_affect_others() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source
        .set_areas(["North Zone", "South Zone", "East Zone", "West Zone"]);
    ctx.geocoder.fail_for("East Zone");

    let report = ctx.geocode_flow().run().await.unwrap();

    assert_eq!(report.dispatched, 4);
    assert_eq!(report.stored, 3);
    assert_eq!(report.failed, 1);
    assert!(ctx.geocodes.get(&AreaKey::new("East Zone")).is_none());
    assert!(!ctx.geocode_cache.contains("East Zone").await.unwrap());
    assert_eq!(ctx.geocode_cache.len(), 3);
}

/// Zero results are neither stored nor marked, so the area is retried.
#[tokio::test]
async fn test_unknown_area_is_retried_next_run() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source.set_areas(["Atlantis", "North Zone"]);

    let first = ctx.geocode_flow().run().await.unwrap();
    assert_eq!(first.empty, 1);
    assert_eq!(first.stored, 1);
    assert!(ctx.geocodes.get(&AreaKey::new("Atlantis")).is_none());
    assert!(!ctx.geocode_cache.contains("Atlantis").await.unwrap());

    ctx.geocoder.reset_calls();
    let second = ctx.geocode_flow().run().await.unwrap();
    assert_eq!(ctx.geocoder.calls(), vec!["Atlantis"]);
    assert_eq!(second.empty, 1);
}

#[tokio::test]
async fn test_failed_upsert_is_not_marked() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source.set_areas(["North Zone", "South Zone"]);
    ctx.geocodes.fail_upserts_for("South Zone");

    let report = ctx.geocode_flow().run().await.unwrap();

    assert_eq!(report.stored, 1);
    assert_eq!(report.store_errors, 1);
    assert!(!ctx.geocode_cache.contains("South Zone").await.unwrap());
    assert!(ctx.geocode_cache.contains("North Zone").await.unwrap());
}

/// Flushing the cache costs store checks, never API calls or duplicate rows.
#[tokio::test]
async fn test_cache_rebuilds_from_store() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source
        .set_areas(["North Zone", "South Zone", "East Zone"]);

    ctx.geocode_flow().run().await.unwrap();
    let rows_before = ctx.geocodes.rows();

    ctx.geocode_cache.clear().await.unwrap();
    ctx.geocoder.reset_calls();

    let report = ctx.geocode_flow().run().await.unwrap();

    assert_eq!(ctx.geocoder.call_count(), 0);
    assert_eq!(report.already_stored, 3);
    assert_eq!(ctx.geocodes.rows(), rows_before);
    assert_eq!(ctx.geocodes.upsert_count(), 3);
    assert_eq!(ctx.geocode_cache.len(), 3);
}

/// A crash between upsert and mark leaves "stored but unmarked"; the next
/// run repairs the cache without calling out.
#[tokio::test]
async fn test_stored_but_unmarked_is_repaired() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source.set_areas(["South Zone"]);
    ctx.geocodes.seed([fixtures::south_zone()]);

    let report = ctx.geocode_flow().run().await.unwrap();

    assert_eq!(report.already_stored, 1);
    assert_eq!(ctx.geocoder.call_count(), 0);
    assert!(ctx.geocode_cache.contains("South Zone").await.unwrap());
}

/// A cache mark whose row was deleted from the store is not trusted.
#[tokio::test]
async fn test_stale_cache_mark_is_refetched() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source.set_areas(["North Zone", "South Zone"]);
    ctx.geocode_flow().run().await.unwrap();

    ctx.geocodes.remove(&AreaKey::new("South Zone"));
    ctx.geocoder.reset_calls();

    let report = ctx.geocode_flow().run().await.unwrap();

    assert_eq!(ctx.geocoder.calls(), vec!["South Zone"]);
    assert_eq!(report.cached, 1);
    assert_eq!(report.stored, 1);
    assert!(ctx.geocodes.get(&AreaKey::new("South Zone")).is_some());
}

#[tokio::test]
async fn test_empty_universe_makes_no_calls() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source.set_areas(["   ", ""]);

    let report = ctx.geocode_flow().run().await.unwrap();

    assert_eq!(report.universe, 0);
    assert_eq!(ctx.geocoder.call_count(), 0);
    assert!(ctx.geocodes.is_empty());
}

#[tokio::test]
async fn test_source_failure_aborts_without_error() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source.set_areas(["North Zone"]);
    ctx.source.set_area_failure(true);

    let report = ctx.geocode_flow().run().await.unwrap();

    assert!(report.is_aborted());
    assert_eq!(ctx.geocoder.call_count(), 0);
}

#[tokio::test]
async fn test_schema_failure_is_an_error() {
    let ctx = TestContext::new().with_geocoder(zone_geocoder());
    ctx.source.set_areas(["North Zone"]);
    ctx.geocodes.set_schema_failure(true);

    assert!(ctx.geocode_flow().run().await.is_err());
    assert_eq!(ctx.geocoder.call_count(), 0);
}
