//! Weather enrichment against in-memory cache, store and weather service.
//!
//! "Today" is pinned to `fixtures::today()` (2024-06-15).

use enrich_core::{AreaDateKey, DedupCache, Horizon};
use integration_tests::{
    fixtures::{self, d, date_range, days_from_today, today, weather_day, weather_key},
    setup::TestContext,
};

fn context_with(areas: &[enrich_core::GeocodeRecord]) -> TestContext {
    let ctx = TestContext::new();
    ctx.geocodes.seed(areas.iter().cloned());
    ctx
}

#[tokio::test]
async fn test_only_missing_days_are_requested() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source.set_order_dates([d(2024, 1, 1), d(2024, 1, 30)]);
    ctx.weather.seed(
        date_range(d(2024, 1, 1), d(2024, 1, 20))
            .into_iter()
            .map(|day| weather_day("South Zone", day)),
    );

    let report = ctx.weather_flow().run().await.unwrap();

    let calls = ctx.weather_api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].window.start, d(2024, 1, 21));
    assert_eq!(calls[0].window.end, d(2024, 1, 30));
    assert_eq!(ctx.weather_api.days_requested(), 10);

    assert_eq!(report.universe, 30);
    assert_eq!(report.already_stored, 20);
    assert_eq!(report.stored, 10);
    assert_eq!(ctx.weather.len(), 30);
    assert_eq!(ctx.weather_cache.len(), 30);
}

#[tokio::test]
async fn test_gaps_become_separate_requests() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source.set_order_dates([d(2024, 3, 1), d(2024, 3, 31)]);
    let missing = [d(2024, 3, 5), d(2024, 3, 6), d(2024, 3, 7), d(2024, 3, 31)];
    ctx.weather.seed(
        date_range(d(2024, 3, 1), d(2024, 3, 31))
            .into_iter()
            .filter(|day| !missing.contains(day))
            .map(|day| weather_day("South Zone", day)),
    );

    ctx.weather_flow().run().await.unwrap();

    let mut windows: Vec<_> = ctx.weather_api.calls().into_iter().map(|c| c.window).collect();
    windows.sort();
    assert_eq!(windows.len(), 2);
    assert_eq!((windows[0].start, windows[0].end), (d(2024, 3, 5), d(2024, 3, 7)));
    assert_eq!((windows[1].start, windows[1].end), (d(2024, 3, 31), d(2024, 3, 31)));
}

#[tokio::test]
async fn test_window_around_today_is_split() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source
        .set_order_dates([days_from_today(-5), days_from_today(5)]);

    let report = ctx.weather_flow().run().await.unwrap();

    let mut calls = ctx.weather_api.calls();
    calls.sort_by_key(|c| c.window.start);
    assert_eq!(calls.len(), 2);

    assert_eq!(calls[0].horizon, Horizon::Past);
    assert_eq!(calls[0].window.start, days_from_today(-5));
    assert_eq!(calls[0].window.end, days_from_today(-1));

    assert_eq!(calls[1].horizon, Horizon::Future);
    assert_eq!(calls[1].window.start, today());
    assert_eq!(calls[1].window.end, days_from_today(5));

    for call in &calls {
        assert_eq!(Horizon::of(&call.window, today()), Some(call.horizon));
    }
    assert_eq!(report.stored, 11);
}

#[tokio::test]
async fn test_long_runs_are_chunked() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source.set_order_dates([d(2024, 1, 1), d(2024, 1, 25)]);

    let report = ctx.weather_flow().with_chunk_days(10).run().await.unwrap();

    let mut lengths: Vec<u32> = ctx
        .weather_api
        .calls()
        .iter()
        .map(|c| c.window.len_days())
        .collect();
    lengths.sort();
    assert_eq!(lengths, vec![5, 10, 10]);
    assert_eq!(report.dispatched, 3);
    assert_eq!(report.stored, 25);
}

#[tokio::test]
async fn test_cached_days_are_skipped() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source.set_order_dates([d(2024, 1, 1), d(2024, 1, 30)]);
    for day in date_range(d(2024, 1, 1), d(2024, 1, 10)) {
        ctx.weather.seed([weather_day("South Zone", day)]);
        ctx.weather_cache
            .mark(&weather_key("South Zone", day))
            .await
            .unwrap();
    }

    let report = ctx.weather_flow().run().await.unwrap();

    assert_eq!(report.cached, 10);
    assert_eq!(ctx.weather_api.days_requested(), 20);
    assert_eq!(ctx.weather_api.calls()[0].window.start, d(2024, 1, 11));
}

/// A day marked in the cache but absent from the store is requested again.
#[tokio::test]
async fn test_stale_cache_mark_is_refetched() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source.set_order_dates([d(2024, 1, 1), d(2024, 1, 5)]);
    ctx.weather_cache
        .mark(&weather_key("South Zone", d(2024, 1, 3)))
        .await
        .unwrap();

    let report = ctx.weather_flow().run().await.unwrap();

    let calls = ctx.weather_api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!((calls[0].window.start, calls[0].window.end), (d(2024, 1, 1), d(2024, 1, 5)));
    assert_eq!(report.cached, 0);
    assert_eq!(report.stored, 5);
    assert!(ctx
        .weather
        .get(&AreaDateKey::new("South Zone", d(2024, 1, 3)))
        .is_some());
}

#[tokio::test]
async fn test_each_window_is_one_store_write() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source.set_order_dates([d(2024, 1, 1), d(2024, 1, 25)]);

    let report = ctx.weather_flow().with_chunk_days(10).run().await.unwrap();

    assert_eq!(report.stored, 25);
    assert_eq!(ctx.weather.write_count(), 3);
    assert_eq!(ctx.weather.len(), 25);
}

#[tokio::test]
async fn test_rejected_batch_leaves_window_unmarked() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source.set_order_dates([d(2024, 1, 1), d(2024, 1, 5)]);
    ctx.weather.fail_upserts_for(weather_key("South Zone", d(2024, 1, 3)));

    let report = ctx.weather_flow().run().await.unwrap();

    assert_eq!(report.stored, 0);
    assert_eq!(report.store_errors, 5);
    assert!(ctx.weather.is_empty());
    assert!(ctx.weather_cache.is_empty());
}

#[tokio::test]
async fn test_second_run_makes_no_calls() {
    let ctx = context_with(&[fixtures::north_zone(), fixtures::south_zone()]);
    ctx.source
        .set_order_dates([days_from_today(-40), days_from_today(3)]);

    let first = ctx.weather_flow().run().await.unwrap();
    assert_eq!(first.stored, 88);

    ctx.weather_api.reset_calls();
    let second = ctx.weather_flow().run().await.unwrap();

    assert_eq!(ctx.weather_api.call_count(), 0);
    assert_eq!(second.cached, 88);
    assert_eq!(ctx.weather.upsert_count(), 88);
}

#[tokio::test]
async fn test_cache_rebuilds_from_store() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source.set_order_dates([d(2024, 2, 1), d(2024, 2, 29)]);

    ctx.weather_flow().run().await.unwrap();
    let rows_before = ctx.weather.rows();

    ctx.weather_cache.clear().await.unwrap();
    ctx.weather_api.reset_calls();

    let report = ctx.weather_flow().run().await.unwrap();

    assert_eq!(ctx.weather_api.call_count(), 0);
    assert_eq!(report.already_stored, 29);
    assert_eq!(ctx.weather.rows(), rows_before);
    assert_eq!(ctx.weather_cache.len(), 29);
}

#[tokio::test]
async fn test_one_failing_area_does_not_affect_others() {
    let ctx = context_with(&[fixtures::north_zone(), fixtures::south_zone()]);
    ctx.source.set_order_dates([d(2024, 1, 1), d(2024, 1, 10)]);
    ctx.weather_api.fail_for("North Zone");

    let report = ctx.weather_flow().run().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.stored, 10);
    assert!(ctx
        .weather
        .get(&AreaDateKey::new("North Zone", d(2024, 1, 1)))
        .is_none());
    assert!(!ctx
        .weather_cache
        .contains(&weather_key("North Zone", d(2024, 1, 1)))
        .await
        .unwrap());
    assert_eq!(ctx.weather_cache.len(), 10);
}

#[tokio::test]
async fn test_missing_daily_series_is_retried() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source.set_order_dates([d(2024, 1, 1), d(2024, 1, 5)]);
    ctx.weather_api.empty_for("South Zone");

    let first = ctx.weather_flow().run().await.unwrap();
    assert_eq!(first.empty, 1);
    assert!(ctx.weather.is_empty());
    assert!(ctx.weather_cache.is_empty());

    ctx.weather_api.reset_calls();
    ctx.weather_flow().run().await.unwrap();
    assert_eq!(ctx.weather_api.call_count(), 1);
}

#[tokio::test]
async fn test_no_orders_makes_no_calls() {
    let ctx = context_with(&[fixtures::south_zone()]);

    let report = ctx.weather_flow().run().await.unwrap();

    assert_eq!(report.universe, 0);
    assert!(!report.is_aborted());
    assert_eq!(ctx.weather_api.call_count(), 0);
}

#[tokio::test]
async fn test_no_geocoded_areas_makes_no_calls() {
    let ctx = TestContext::new();
    ctx.source.set_order_dates([d(2024, 1, 1), d(2024, 1, 5)]);

    let report = ctx.weather_flow().run().await.unwrap();

    assert_eq!(report.universe, 0);
    assert_eq!(ctx.weather_api.call_count(), 0);
}

#[tokio::test]
async fn test_order_source_failure_aborts_without_error() {
    let ctx = context_with(&[fixtures::south_zone()]);
    ctx.source.set_order_failure(true);

    let report = ctx.weather_flow().run().await.unwrap();

    assert!(report.is_aborted());
    assert_eq!(ctx.weather_api.call_count(), 0);
}
