//! HTTP request and response payloads.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{JobId, StorageKey};

/// Body of `POST /download` and `POST /download-async`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DownloadRequest {
    /// Source video URL.
    #[serde(alias = "url")]
    #[validate(url(message = "must be a valid URL"))]
    pub youtube_url: String,
}

/// Response of a completed synchronous download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub s3_key: StorageKey,
    pub message: String,
}

impl DownloadResponse {
    pub fn new(s3_key: StorageKey) -> Self {
        Self {
            s3_key,
            message: "Video processed and uploaded successfully".to_string(),
        }
    }
}

/// Response of an accepted background download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncDownloadResponse {
    pub task_id: JobId,
    pub message: String,
    pub status: String,
}

impl AsyncDownloadResponse {
    pub fn accepted(task_id: JobId) -> Self {
        Self {
            task_id,
            message: "Video processing started in background".to_string(),
            status: "processing".to_string(),
        }
    }
}

/// Response of `GET /generate-key`. The key is shown once and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedKeyResponse {
    pub api_key: String,
    pub message: String,
    pub usage: String,
}

impl GeneratedKeyResponse {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            message: "Store this key securely. It cannot be retrieved again.".to_string(),
            usage: "Include in Authorization header: Bearer <api_key>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_request_accepts_url_alias() {
        let req: DownloadRequest =
            serde_json::from_str(r#"{"url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"}"#)
                .unwrap();
        assert_eq!(req.youtube_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_download_request_rejects_garbage() {
        let req = DownloadRequest {
            youtube_url: "not a url".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_async_response_shape() {
        let response = AsyncDownloadResponse::accepted(JobId::from_string("abc"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["task_id"], "abc");
        assert_eq!(json["status"], "processing");
    }
}
