//! Insights REST endpoint and the shared read path behind every data route.

use aquadash_core::{summarize, AquadashError, Insights};
use aquadash_storage::{DataRead, DataRefreshOrchestrator};
use axum::{extract::State, Json};

use crate::error::ApiResult;
use crate::telemetry::METRICS;

/// Read the current table through the orchestrator and aggregate it.
pub(crate) async fn load_insights(
    orchestrator: &DataRefreshOrchestrator,
) -> ApiResult<(DataRead, Insights)> {
    let read = orchestrator.get_data().await?;
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_cache_lookup(read.cache_status().as_str());
    }

    let insights = summarize(read.table()).map_err(AquadashError::from)?;
    tracing::debug!(
        source = ?read.source(),
        rows = read.table().len(),
        safe = insights.safe_count,
        unsafe_rows = insights.unsafe_count,
        "Insights computed"
    );
    Ok((read, insights))
}

/// GET /api/v1/insights - Current insights as JSON
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/insights",
    tag = "Insights",
    responses(
        (status = 200, description = "Insights over the current observation table", body = Insights),
        (status = 502, description = "Record store returned malformed rows", body = crate::error::ApiError),
        (status = 503, description = "Record store unavailable", body = crate::error::ApiError),
    ),
))]
pub async fn get_insights(
    State(orchestrator): State<DataRefreshOrchestrator>,
) -> ApiResult<Json<Insights>> {
    let (_, insights) = load_insights(&orchestrator).await?;
    Ok(Json(insights))
}
