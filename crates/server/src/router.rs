//! HTTP router construction.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use trustbot_core::config::ServerConfig;

use crate::api;
use crate::state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!("Invalid CORS_ORIGIN '{}': {} (falling back to permissive)", origin, e);
            CorsLayer::permissive()
        }
    }
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/healthz", get(api::healthz))
        .route("/health", get(api::health))
        .route("/v1/analyze", post(api::analyze))
        .route(
            "/v1/evidence/{receipt}",
            get(api::evidence_get).delete(api::evidence_purge),
        )
        .layer(DefaultBodyLimit::max(config.max_body_mb * 1024 * 1024))
        .layer(cors_layer(&config.cors_origin))
        .with_state(state)
}
