//! AQUADASH API - Water Quality Dashboard Service
//!
//! Serves the dashboard page and its JSON, health and metrics endpoints.
//! Every data route reads through the [`DataRefreshOrchestrator`], which
//! consults the cache first and falls back to the Postgres record store.

use std::sync::Arc;

use aquadash_storage::{
    CacheBackend, CacheLayer, DataRefreshOrchestrator, InMemoryCacheBackend, RecordStore,
    RedisCacheBackend,
};

pub mod config;
pub mod db;
pub mod error;
mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod presentation;
pub mod routes;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::{ApiConfig, CacheSettings};
pub use db::{DbConfig, DbSslMode, PgRecordStore};
pub use error::{ApiError, ApiResult, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;

/// Build the cache layer described by `settings`.
///
/// Returns `None` when caching is disabled. A configured URL selects Redis;
/// otherwise the cache is process-local.
pub fn build_cache(settings: &CacheSettings) -> ApiResult<Option<CacheLayer>> {
    if !settings.enabled {
        return Ok(None);
    }

    let backend: Arc<dyn CacheBackend> = match &settings.url {
        Some(url) => Arc::new(RedisCacheBackend::new(url)?),
        None => Arc::new(InMemoryCacheBackend::new()),
    };
    tracing::info!(
        backend = backend.name(),
        ttl_secs = settings.ttl.as_secs(),
        "Cache enabled"
    );
    Ok(Some(CacheLayer::new(backend, settings.timeout)))
}

/// Assemble application state around an arbitrary record store.
pub fn build_state(
    api_config: &ApiConfig,
    store: Arc<dyn RecordStore>,
    store_timeout: std::time::Duration,
) -> ApiResult<AppState> {
    let refresh = api_config.refresh_config(store_timeout);
    refresh.validate()?;

    let cache = build_cache(&api_config.cache)?;
    let orchestrator = DataRefreshOrchestrator::new(store, cache, refresh);
    Ok(AppState::new(orchestrator))
}
