//! Refresh orchestration tests against the shared fakes.
//!
//! Covers the cache-first read path, fail-open behaviour, store failure
//! propagation and the retry bound.

use std::sync::Arc;
use std::time::Duration;

use aquadash_core::{AquadashError, AquadashResult, RetryConfig, StoreError};
use aquadash_storage::{
    CacheLayer, CacheStatus, DataRefreshOrchestrator, DataSource, InMemoryCacheBackend,
    RefreshConfig, WATER_QUALITY_CACHE_KEY,
};
use aquadash_test_utils::assertions::{assert_malformed_row, assert_store_unavailable};
use aquadash_test_utils::{
    fixtures, FailingCacheBackend, FlakyRecordStore, MalformedRecordStore, SlowRecordStore,
    StaticRecordStore,
};

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        backoff_multiplier: 2.0,
    }
}

fn memory_layer() -> CacheLayer {
    CacheLayer::with_default_timeout(Arc::new(InMemoryCacheBackend::new()))
}

#[tokio::test]
async fn test_cache_round_trip_before_ttl() -> AquadashResult<()> {
    let table = fixtures::sample_table();
    let layer = memory_layer();

    layer
        .set(WATER_QUALITY_CACHE_KEY, &table, Duration::from_secs(60))
        .await;
    assert_eq!(layer.get(WATER_QUALITY_CACHE_KEY).await, Some(table));
    Ok(())
}

#[tokio::test]
async fn test_entry_with_one_second_ttl_expires() {
    let layer = memory_layer();
    layer
        .set(
            WATER_QUALITY_CACHE_KEY,
            &fixtures::sample_table(),
            Duration::from_secs(1),
        )
        .await;

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(layer.get(WATER_QUALITY_CACHE_KEY).await, None);
}

#[tokio::test]
async fn test_expired_cache_goes_back_to_store() -> AquadashResult<()> {
    let store = Arc::new(StaticRecordStore::new(fixtures::sample_table()));
    let config = RefreshConfig::new().with_cache_ttl(Duration::from_secs(1));
    let orchestrator = DataRefreshOrchestrator::new(store.clone(), Some(memory_layer()), config);

    orchestrator.get_data().await?;
    assert!(orchestrator.get_data().await?.was_cache_hit());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let read = orchestrator.get_data().await?;
    assert_eq!(read.cache_status(), CacheStatus::Miss);
    assert_eq!(store.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_store_changes_are_hidden_until_expiry() -> AquadashResult<()> {
    let store = Arc::new(StaticRecordStore::new(fixtures::sample_table()));
    let orchestrator =
        DataRefreshOrchestrator::new(store.clone(), Some(memory_layer()), RefreshConfig::default());

    let first = orchestrator.get_data().await?;
    store.replace(fixtures::two_city_table());

    let second = orchestrator.get_data().await?;
    assert_eq!(second.table(), first.table());

    orchestrator.invalidate().await;
    let third = orchestrator.get_data().await?;
    assert_eq!(third.table(), &fixtures::two_city_table());
    Ok(())
}

#[tokio::test]
async fn test_failing_cache_falls_back_to_store() -> AquadashResult<()> {
    let backend = Arc::new(FailingCacheBackend::new());
    let store = Arc::new(StaticRecordStore::new(fixtures::sample_table()));
    let layer = CacheLayer::with_default_timeout(backend.clone());
    let orchestrator =
        DataRefreshOrchestrator::new(store.clone(), Some(layer), RefreshConfig::default());

    let read = orchestrator.get_data().await?;
    assert_eq!(read.table(), &fixtures::sample_table());
    assert_eq!(read.cache_status(), CacheStatus::Unavailable);
    assert_eq!(read.source(), DataSource::Store);

    // The write is still attempted and its failure swallowed.
    assert_eq!(backend.gets(), 1);
    assert_eq!(backend.sets(), 1);

    let stats = orchestrator.cache_stats();
    assert_eq!(stats.map(|s| (s.read_errors, s.write_errors)), Some((1, 1)));
    Ok(())
}

#[tokio::test]
async fn test_store_down_with_empty_cache_fails() {
    let store = Arc::new(FlakyRecordStore::down());
    let config = RefreshConfig::new().with_retry(fast_retry(0));
    let layer = memory_layer();
    let orchestrator = DataRefreshOrchestrator::new(store, Some(layer.clone()), config);

    let result = orchestrator.get_data().await;
    assert_store_unavailable(&result);
    assert_eq!(layer.get(WATER_QUALITY_CACHE_KEY).await, None);
}

#[tokio::test]
async fn test_cache_disabled_never_touches_cache() -> AquadashResult<()> {
    let backend = Arc::new(FailingCacheBackend::new());
    let store = Arc::new(StaticRecordStore::new(fixtures::sample_table()));
    let orchestrator = DataRefreshOrchestrator::new(
        store.clone(),
        Some(CacheLayer::with_default_timeout(backend.clone())),
        RefreshConfig::new().with_cache_enabled(false),
    );

    for _ in 0..3 {
        let read = orchestrator.get_data().await?;
        assert_eq!(read.cache_status(), CacheStatus::Disabled);
    }
    assert_eq!(store.calls(), 3);
    assert_eq!(backend.gets(), 0);
    assert_eq!(backend.sets(), 0);
    Ok(())
}

#[tokio::test]
async fn test_transient_failures_are_retried() -> AquadashResult<()> {
    let store = Arc::new(FlakyRecordStore::new(fixtures::sample_table(), 2));
    let config = RefreshConfig::new().with_retry(fast_retry(2));
    let orchestrator = DataRefreshOrchestrator::without_cache(store.clone(), config);

    let read = orchestrator.get_data().await?;
    assert_eq!(read.attempts(), 3);
    assert_eq!(store.calls(), 3);
    Ok(())
}

#[tokio::test]
async fn test_retries_stop_at_bound() {
    let store = Arc::new(FlakyRecordStore::down());
    let config = RefreshConfig::new().with_retry(fast_retry(2));
    let orchestrator = DataRefreshOrchestrator::without_cache(store.clone(), config);

    let result = orchestrator.get_data().await;
    assert_store_unavailable(&result);
    assert_eq!(store.calls(), 3);
}

#[tokio::test]
async fn test_malformed_rows_are_not_retried() {
    let store = Arc::new(MalformedRecordStore::new());
    let config = RefreshConfig::new().with_retry(fast_retry(3));
    let orchestrator = DataRefreshOrchestrator::without_cache(store.clone(), config);

    let result = orchestrator.get_data().await;
    assert_malformed_row(&result);
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let store = Arc::new(SlowRecordStore::new(
        fixtures::sample_table(),
        Duration::from_millis(500),
    ));
    let config = RefreshConfig::new()
        .with_store_timeout(Duration::from_millis(20))
        .with_retry(fast_retry(1));
    let orchestrator = DataRefreshOrchestrator::without_cache(store.clone(), config);

    match orchestrator.get_data().await {
        Err(AquadashError::Store(StoreError::Timeout { timeout })) => {
            assert_eq!(timeout, Duration::from_millis(20));
        }
        other => panic!("expected store timeout, got {:?}", other.map(|r| r.attempts())),
    }
    assert_eq!(store.calls(), 2);
}
