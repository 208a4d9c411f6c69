//! Download handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use validator::Validate;
use ytdl_models::{AsyncDownloadResponse, DownloadRequest, DownloadResponse};

use crate::auth::MeteredApiKey;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::validate_source_url;
use crate::state::AppState;

/// Check the request body and return the normalized source URL.
fn source_url(request: &DownloadRequest) -> ApiResult<String> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    validate_source_url(&request.youtube_url).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Download a video and wait for the upload to finish.
pub async fn download(
    State(state): State<AppState>,
    MeteredApiKey(fingerprint): MeteredApiKey,
    Json(request): Json<DownloadRequest>,
) -> ApiResult<Json<DownloadResponse>> {
    let url = source_url(&request)?;
    info!(fingerprint = %fingerprint, url = %url, "Processing download request");
    metrics::record_job_submitted("sync");

    let key = state.executor.submit(&url).await?;

    Ok(Json(DownloadResponse::new(key)))
}

/// Start a download in the background and return its job id.
pub async fn download_async(
    State(state): State<AppState>,
    MeteredApiKey(fingerprint): MeteredApiKey,
    Json(request): Json<DownloadRequest>,
) -> ApiResult<(StatusCode, Json<AsyncDownloadResponse>)> {
    let url = source_url(&request)?;
    info!(fingerprint = %fingerprint, url = %url, "Processing background download request");
    metrics::record_job_submitted("async");

    let job_id = state.executor.submit_detached(&url)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AsyncDownloadResponse::accepted(job_id)),
    ))
}
