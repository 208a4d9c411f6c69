//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{download, download_async, generate_key, health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, ip_flood_guard, request_id, request_logging, security_headers, IpFloodGuard,
    SecurityHeaders,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let flood_guard = Arc::new(IpFloodGuard::new(
        state.config.ip_rate_limit_rps,
        state.config.trust_proxy_headers,
    ));
    let header_policy = SecurityHeaders {
        hsts: state.config.is_production(),
    };

    // /ready runs yt-dlp and a bucket round trip, so it shares the flood guard
    let guarded_routes = Router::new()
        .route("/download", post(download))
        .route("/download-async", post(download_async))
        .route("/generate-key", get(generate_key))
        .route("/ready", get(ready))
        .layer(middleware::from_fn_with_state(flood_guard, ip_flood_guard));

    let health_routes = Router::new().route("/health", get(health));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(guarded_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn_with_state(header_policy, security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
