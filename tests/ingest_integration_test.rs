//! End-to-end ingestion scenarios: fetch-or-cache decisions, duplicate-safe
//! persistence, and failure-path behavior, driven through the service layer
//! against an in-memory SQLite store and a scripted bar source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use stockdash_backend::config::AppConfig;
use stockdash_backend::db::bar_queries;
use stockdash_backend::errors::AppError;
use stockdash_backend::external::bar_source::{BarSource, BarSourceError, RawBar};
use stockdash_backend::services::{comparison_service, ingest_service, processor};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct ScriptedSource {
    bars: Vec<RawBar>,
    fail: bool,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn returning(bars: Vec<RawBar>) -> Self {
        Self { bars, fail: false, calls: AtomicUsize::new(0) }
    }

    fn failing() -> Self {
        Self { bars: Vec::new(), fail: true, calls: AtomicUsize::new(0) }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BarSource for ScriptedSource {
    async fn fetch_daily_bars(
        &self,
        _symbol: &str,
        _lookback_days: u32,
    ) -> Result<Vec<RawBar>, BarSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BarSourceError::Network("connection refused".to_string()));
        }
        Ok(self.bars.clone())
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        allowed_origins: Vec::new(),
        cors_allow_all: true,
        sufficiency_threshold: 50,
        lookback_days: 365,
        fetch_timeout_secs: 2,
        symbols: vec!["TCS".to_string(), "INFY".to_string(), "WIPRO".to_string()],
        provider_symbols: HashMap::new(),
    }
}

async fn setup_pool() -> SqlitePool {
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// `count` consecutive daily bars starting 2024-01-01, each closing 2%
/// above its open.
fn daily_bars(count: i64) -> Vec<RawBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            let open = 100.0 + i as f64;
            let close = open * 1.02;
            RawBar {
                date: start + Duration::days(i),
                open: Some(open),
                high: Some(close + 1.0),
                low: Some(open - 1.0),
                close: Some(close),
                volume: Some(1_000_000),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Fetch-or-cache scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_fetch_serves_requested_window_and_populates_store() {
    let pool = setup_pool().await;
    let config = test_config();
    let source = ScriptedSource::returning(daily_bars(60));

    let (symbol, bars) = ingest_service::get_series(&pool, &source, &config, "TCS", 30)
        .await
        .unwrap();

    assert_eq!(symbol, "TCS");
    assert_eq!(bars.len(), 30);
    // The window is the chronological tail of the fetched series.
    assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    assert_eq!(bars[29].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    assert!(bars.windows(2).all(|w| w[0].date < w[1].date));

    // The full lookback was merged, not just the requested window.
    assert_eq!(bar_queries::count_for_symbol(&pool, "TCS").await.unwrap(), 60);

    for p in processor::derive(&bars) {
        assert!((p.daily_return - 0.02).abs() < 1e-12);
    }
}

#[tokio::test]
async fn sufficient_store_skips_the_source_entirely() {
    let pool = setup_pool().await;
    let config = test_config();
    let source = ScriptedSource::returning(daily_bars(60));

    let (_, first) = ingest_service::get_series(&pool, &source, &config, "TCS", 30)
        .await
        .unwrap();
    assert_eq!(source.call_count(), 1);

    // 60 stored rows exceed the threshold of 50, so no second fetch.
    let (_, second) = ingest_service::get_series(&pool, &source, &config, "TCS", 30)
        .await
        .unwrap();
    assert_eq!(source.call_count(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn lowercase_symbol_is_normalized() {
    let pool = setup_pool().await;
    let config = test_config();
    let source = ScriptedSource::returning(daily_bars(10));

    let (symbol, bars) = ingest_service::get_series(&pool, &source, &config, " tcs ", 5)
        .await
        .unwrap();
    assert_eq!(symbol, "TCS");
    assert_eq!(bars.len(), 5);
}

#[tokio::test]
async fn unknown_symbol_is_rejected_before_any_io() {
    let pool = setup_pool().await;
    let config = test_config();
    let source = ScriptedSource::returning(daily_bars(60));

    let err = ingest_service::get_series(&pool, &source, &config, "ZZZ", 30)
        .await
        .unwrap_err();

    match err {
        AppError::Validation(msg) => {
            assert!(msg.contains("ZZZ"));
            // the rejection names the valid universe
            assert!(msg.contains("TCS"));
        }
        other => panic!("expected Validation, got {other:?}"),
    }
    assert_eq!(source.call_count(), 0);
}

#[tokio::test]
async fn source_failure_with_empty_store_is_data_unavailable() {
    let pool = setup_pool().await;
    let config = test_config();
    let source = ScriptedSource::failing();

    let err = ingest_service::get_series(&pool, &source, &config, "WIPRO", 30)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DataUnavailable(_)));
    // one bounded attempt plus a single retry
    assert_eq!(source.call_count(), 2);
}

#[tokio::test]
async fn source_failure_with_cached_rows_serves_stale_data() {
    let pool = setup_pool().await;
    let config = test_config();

    let cached = processor::clean("INFY", daily_bars(10));
    assert_eq!(bar_queries::insert_new(&pool, &cached).await.unwrap(), 10);

    let source = ScriptedSource::failing();
    let (_, bars) = ingest_service::get_series(&pool, &source, &config, "INFY", 30)
        .await
        .unwrap();

    assert_eq!(bars.len(), 10);
}

#[tokio::test]
async fn days_parameter_is_clamped() {
    let pool = setup_pool().await;
    let config = test_config();
    let source = ScriptedSource::returning(daily_bars(60));

    let (_, bars) = ingest_service::get_series(&pool, &source, &config, "TCS", 0)
        .await
        .unwrap();
    assert_eq!(bars.len(), 1);

    let (_, bars) = ingest_service::get_series(&pool, &source, &config, "TCS", 10_000)
        .await
        .unwrap();
    assert_eq!(bars.len(), 60);
}

#[tokio::test]
async fn comparison_flow_runs_ingestion_for_both_symbols() {
    let pool = setup_pool().await;
    let config = test_config();
    let source = ScriptedSource::returning(daily_bars(60));

    let (s1, b1) = ingest_service::get_history(&pool, &source, &config, "TCS")
        .await
        .unwrap();
    let (s2, b2) = ingest_service::get_history(&pool, &source, &config, "INFY")
        .await
        .unwrap();
    assert_eq!(source.call_count(), 2);

    let result = comparison_service::compare(
        &s1,
        &processor::derive(&b1),
        &s2,
        &processor::derive(&b2),
    );

    // The scripted source serves both symbols the same series.
    assert!((result.correlation - 1.0).abs() < 1e-6);
    assert_eq!(result.insights.return_difference, 0.0);
    assert_eq!(result.insights.better_performer, "TCS");
}

// ---------------------------------------------------------------------------
// Duplicate-safe persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reinserting_the_same_batch_inserts_zero_rows() {
    let pool = setup_pool().await;
    let bars = processor::clean("TCS", daily_bars(60));

    assert_eq!(bar_queries::insert_new(&pool, &bars).await.unwrap(), 60);
    assert_eq!(bar_queries::insert_new(&pool, &bars).await.unwrap(), 0);
    assert_eq!(bar_queries::count_for_symbol(&pool, "TCS").await.unwrap(), 60);
}

#[tokio::test]
async fn overlapping_batches_only_add_new_dates() {
    let pool = setup_pool().await;
    let all = processor::clean("TCS", daily_bars(60));

    assert_eq!(bar_queries::insert_new(&pool, &all[..40]).await.unwrap(), 40);
    assert_eq!(bar_queries::insert_new(&pool, &all).await.unwrap(), 20);

    let stored = bar_queries::fetch_all(&pool, "TCS").await.unwrap();
    assert_eq!(stored.len(), 60);
    // strictly ascending, so no duplicate dates either
    assert!(stored.windows(2).all(|w| w[0].date < w[1].date));
}

#[tokio::test]
async fn fetch_range_bounds_are_inclusive() {
    let pool = setup_pool().await;
    let all = processor::clean("TCS", daily_bars(10));
    bar_queries::insert_new(&pool, &all).await.unwrap();

    let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
    let stored = bar_queries::fetch_range(&pool, "TCS", Some(start), Some(end))
        .await
        .unwrap();

    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0].date, start);
    assert_eq!(stored[3].date, end);
}

#[tokio::test]
async fn symbols_do_not_leak_across_queries() {
    let pool = setup_pool().await;
    bar_queries::insert_new(&pool, &processor::clean("TCS", daily_bars(5)))
        .await
        .unwrap();
    bar_queries::insert_new(&pool, &processor::clean("INFY", daily_bars(7)))
        .await
        .unwrap();

    assert_eq!(bar_queries::fetch_all(&pool, "TCS").await.unwrap().len(), 5);
    assert_eq!(bar_queries::fetch_all(&pool, "INFY").await.unwrap().len(), 7);
    assert!(bar_queries::fetch_all(&pool, "WIPRO").await.unwrap().is_empty());
}
