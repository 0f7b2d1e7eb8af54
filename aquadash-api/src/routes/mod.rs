//! HTTP Routes Module
//!
//! Includes:
//! - The dashboard page at `/`
//! - Insights as JSON at `/api/v1/insights`
//! - Health check endpoints (Kubernetes-compatible)
//! - Prometheus metrics
//! - The OpenAPI document (with the `openapi` feature)

pub mod dashboard;
pub mod health;
pub mod insights;

use axum::{middleware::from_fn, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub use health::create_router as health_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /api/v1/openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

async fn not_found() -> ApiError {
    ApiError::not_found("No route for this path")
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the complete application router.
///
/// Layers, outermost first: `TraceLayer`, then the observability
/// middleware, which sees the matched route template.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/api/v1/insights", get(insights::get_insights))
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler));

    #[cfg(feature = "openapi")]
    let router = router.route("/api/v1/openapi.json", get(openapi_json));

    router
        .fallback(not_found)
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
