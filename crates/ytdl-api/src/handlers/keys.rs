//! API key generation.

use axum::Json;
use tracing::info;
use ytdl_models::GeneratedKeyResponse;

use crate::auth::{generate_api_key, ApiKey, DEFAULT_KEY_BYTES};

/// Issue a fresh random key. It must be added to the configured key set
/// before it is accepted.
pub async fn generate_key(ApiKey(fingerprint): ApiKey) -> Json<GeneratedKeyResponse> {
    info!(fingerprint = %fingerprint, "Generated new API key");
    Json(GeneratedKeyResponse::new(generate_api_key(DEFAULT_KEY_BYTES)))
}
