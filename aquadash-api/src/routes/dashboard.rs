//! Dashboard page.

use aquadash_storage::DataRefreshOrchestrator;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};

use crate::error::{ApiError, ApiResult};
use crate::presentation::{build_charts, render_dashboard, PageMeta};
use crate::routes::insights::load_insights;

/// GET / - Full dashboard page
///
/// Failures render as an HTML error page carrying the same status code a
/// JSON route would return.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Dashboard page", content_type = "text/html"),
        (status = 502, description = "Record store returned malformed rows", content_type = "text/html"),
        (status = 503, description = "Record store unavailable", content_type = "text/html"),
    ),
))]
pub async fn dashboard(State(orchestrator): State<DataRefreshOrchestrator>) -> Response {
    match render(&orchestrator).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => err.into_html_response(),
    }
}

async fn render(orchestrator: &DataRefreshOrchestrator) -> ApiResult<String> {
    let (read, insights) = load_insights(orchestrator).await?;
    let charts = build_charts(read.table(), &insights);
    let meta = PageMeta {
        cache_status: read.cache_status(),
        fetched_at: read.fetched_at(),
    };
    render_dashboard(&insights, &charts, meta).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize chart figures");
        ApiError::internal_error("Failed to render dashboard")
    })
}
