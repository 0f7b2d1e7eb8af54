//! AQUADASH Server Entry Point
//!
//! Bootstraps logging and configuration, wires the record store and cache
//! into the refresh orchestrator, and starts the Axum HTTP server.

use std::sync::Arc;

use aquadash_api::telemetry::{init_tracing, TelemetryConfig};
use aquadash_api::{
    build_state, create_router, ApiConfig, ApiError, ApiResult, DbConfig, PgRecordStore,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env()?;
    let db_config = DbConfig::from_env()?;

    let store = Arc::new(PgRecordStore::new(&db_config)?);
    let state = build_state(&api_config, store, db_config.timeout)?;
    let app = create_router(state);

    let addr = api_config.socket_addr()?;
    tracing::info!(
        %addr,
        db_host = %db_config.host,
        db_name = %db_config.dbname,
        db_sslmode = %db_config.sslmode,
        cache_enabled = api_config.cache.enabled,
        "Starting AQUADASH server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
