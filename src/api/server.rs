//! HTTP API server: router assembly, CORS, and the serve loop

use super::{baselines, evaluations, heuristics, recommendations, ApiError, AppState};
use crate::config::Settings;
use crate::storage::StorageBackend;
use axum::{
    http::{header::HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// API server wiring the storage backend and settings into an axum router
pub struct ApiServer {
    settings: Settings,
    storage: Arc<dyn StorageBackend>,
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

impl ApiServer {
    pub fn new(storage: Arc<dyn StorageBackend>, settings: Settings) -> Self {
        Self { settings, storage }
    }

    /// Build the full router with middleware applied
    pub fn build_router(state: AppState) -> Router {
        let cors = Self::cors_layer(&state.settings);

        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            // Evaluations
            .route(
                "/api/evaluations",
                post(evaluations::create_evaluation).get(evaluations::list_evaluations),
            )
            .route(
                "/api/evaluations/:id",
                get(evaluations::get_evaluation).delete(evaluations::delete_evaluation),
            )
            .route(
                "/api/evaluations/:id/execute",
                post(evaluations::execute_evaluation),
            )
            .route(
                "/api/evaluations/:id/reports",
                get(evaluations::generate_report),
            )
            // Findings
            .route(
                "/api/evaluations/:id/heuristics",
                get(heuristics::list_findings),
            )
            .route(
                "/api/evaluations/:id/heuristics/:heuristic_type",
                get(heuristics::get_finding),
            )
            // Recommendations
            .route(
                "/api/evaluations/:id/recommendations",
                get(recommendations::list_recommendations),
            )
            .route(
                "/api/evaluations/:id/recommendations/:rec_id",
                get(recommendations::get_recommendation),
            )
            // Baselines and trends
            .route("/api/baselines", post(baselines::create_baseline))
            .route("/api/baselines/:id", get(baselines::get_baseline))
            .route("/api/evaluations/:id/trends", get(baselines::get_trends))
            .fallback(fallback_handler)
            .with_state(state)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Credentialed CORS restricted to the configured origins
    ///
    /// Credentials rule out wildcard origins, so methods and headers mirror
    /// the request instead.
    fn cors_layer(settings: &Settings) -> CorsLayer {
        let origins: Vec<HeaderValue> = settings
            .cors_origins_list()
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }

    /// Bind the configured address and serve until the process exits
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.settings.api_host, self.settings.api_port);
        let state = AppState::new(self.storage, self.settings);
        let router = Self::build_router(state);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("API server listening on http://{}", addr);
        axum::serve(listener, router).await?;
        Ok(())
    }
}

async fn root_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Unmatched routes get the same envelope as missing resources
async fn fallback_handler() -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        code: "NOT_FOUND".to_string(),
        message: "Route not found".to_string(),
        details: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_reports_service_info() {
        let response = root_handler().await;
        assert_eq!(response.0.status, "operational");
        assert_eq!(response.0.name, "biascope");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = health_handler().await;
        assert_eq!(response.0.status, "ok");
    }

    #[test]
    fn test_cors_parses_configured_origins() {
        let settings = Settings::default();
        // Builds without panicking on the default origin list
        let _ = ApiServer::cors_layer(&settings);
    }
}
