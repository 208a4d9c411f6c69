//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::auth::AuthError;

/// Install the Prometheus recorder and return its render handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "ytdl_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "ytdl_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "ytdl_http_requests_in_flight";

    pub const RATE_LIMIT_HITS_TOTAL: &str = "ytdl_rate_limit_hits_total";
    pub const AUTH_FAILURES_TOTAL: &str = "ytdl_auth_failures_total";
    pub const JOBS_SUBMITTED_TOTAL: &str = "ytdl_jobs_submitted_total";
}

/// Routes served by the API; anything else is labeled `other`.
const KNOWN_PATHS: &[&str] = &[
    "/download",
    "/download-async",
    "/generate-key",
    "/health",
    "/ready",
    "/metrics",
];

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", normalize_path(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a rejected request; `scope` is `credential` or `ip`.
pub fn record_rate_limit_hit(scope: &'static str) {
    counter!(names::RATE_LIMIT_HITS_TOTAL, "scope" => scope).increment(1);
}

pub fn record_auth_failure(err: &AuthError) {
    let reason = match err {
        AuthError::MissingCredential => "missing",
        AuthError::InvalidScheme => "scheme",
        AuthError::InvalidCredential => "invalid",
        AuthError::RateLimited { .. } => "rate_limited",
    };
    counter!(names::AUTH_FAILURES_TOTAL, "reason" => reason).increment(1);
}

/// Record a job accepted by a download endpoint; `mode` is `sync` or `async`.
pub fn record_job_submitted(mode: &'static str) {
    counter!(names::JOBS_SUBMITTED_TOTAL, "mode" => mode).increment(1);
}

/// Keep path labels bounded.
fn normalize_path(path: &str) -> &str {
    KNOWN_PATHS
        .iter()
        .find(|known| **known == path)
        .copied()
        .unwrap_or("other")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
