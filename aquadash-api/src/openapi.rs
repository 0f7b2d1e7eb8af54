//! OpenAPI Specification for the AQUADASH API
//!
//! Generated by utoipa from the route annotations and the schema derives
//! on the response types.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{
    CacheHealth, ComponentHealth, HealthDetails, HealthResponse, HealthStatus,
};
use crate::routes::{dashboard, health, insights};
use crate::telemetry::metrics;

use aquadash_core::{AcceptableRange, Insights, Measurement, ObservationRow, QualityLabel};

/// OpenAPI document for the AQUADASH API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AQUADASH API",
        version = "0.1.0",
        description = "Water quality dashboard: observation insights, chart page, health and metrics",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Dashboard", description = "Rendered HTML dashboard"),
        (name = "Insights", description = "Aggregated water quality figures"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        dashboard::dashboard,
        insights::get_insights,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            ApiError, ErrorCode,
            Insights, Measurement, AcceptableRange, ObservationRow, QualityLabel,
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth, CacheHealth,
        )
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "AQUADASH API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi
            .tags
            .as_ref()
            .ok_or_else(|| "OpenAPI tags missing".to_string())?;
        assert_eq!(tags.len(), 4);

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.schemas.contains_key("Insights"));
        assert!(components.schemas.contains_key("ApiError"));
        Ok(())
    }

    #[test]
    fn test_openapi_json_serialization() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        serde_json::from_str::<serde_json::Value>(&json)
            .map_err(|e| format!("Generated JSON invalid: {}", e))?;
        assert!(json.contains("AQUADASH API"));
        Ok(())
    }

    #[test]
    fn test_openapi_paths_exist() {
        let openapi = ApiDoc::openapi();
        let paths = [
            "/",
            "/api/v1/insights",
            "/health/ping",
            "/health/live",
            "/health/ready",
            "/metrics",
        ];
        for path in paths {
            assert!(openapi.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
