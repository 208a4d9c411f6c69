//! Health check handlers.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use ytdl_worker::StorageBinding;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "ytdl-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub ytdlp: CheckStatus,
    pub storage: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn ok(started: Instant) -> Self {
        Self {
            status: "ok".to_string(),
            version: None,
            error: None,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            version: None,
            error: Some(msg.into()),
            latency_ms: None,
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness check endpoint (readiness probe).
/// Checks the yt-dlp binary and bucket reachability.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let ytdlp_check = {
        let start = Instant::now();
        match ytdl_media::ytdlp_version(&state.ytdlp_path).await {
            Ok(version) => CheckStatus {
                version: Some(version),
                ..CheckStatus::ok(start)
            },
            Err(e) => CheckStatus::error(e.to_string()),
        }
    };

    let storage_check = match state.executor.pipeline().storage() {
        StorageBinding::Ready(uploader) => {
            let start = Instant::now();
            match uploader.store().check_connectivity().await {
                Ok(()) => CheckStatus::ok(start),
                Err(e) => CheckStatus::error(e.to_string()),
            }
        }
        StorageBinding::Missing(reason) => CheckStatus::error(reason.clone()),
    };

    let all_ok = ytdlp_check.is_ok() && storage_check.is_ok() && !state.executor.is_shutting_down();

    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            ytdlp: ytdlp_check,
            storage: storage_check,
        },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
