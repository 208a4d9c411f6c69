//! API error types.

use axum::http::header::{RETRY_AFTER, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use ytdl_worker::ExecutorError;

use crate::auth::AuthError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Detail returned for failures whose cause stays in the logs.
const INTERNAL_DETAIL: &str = "Internal server error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Video processing failed: {0}")]
    Processing(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Processing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ExecutorError> for ApiError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::ShuttingDown => {
                ApiError::Unavailable(ExecutorError::ShuttingDown.to_string())
            }
            ExecutorError::Pipeline(e) if e.is_internal() => ApiError::Internal(e.to_string()),
            ExecutorError::Pipeline(e) => ApiError::Processing(e.to_string()),
            ExecutorError::Panicked(msg) => ApiError::Internal(msg),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = match &self {
            ApiError::Internal(cause) => {
                error!("Unexpected error: {}", cause);
                INTERNAL_DETAIL.to_string()
            }
            _ => self.to_string(),
        };

        let mut response = (status, Json(ErrorResponse { detail })).into_response();

        if let ApiError::Auth(auth) = &self {
            let headers = response.headers_mut();
            match auth {
                AuthError::RateLimited { retry_after_secs } => {
                    headers.insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
                }
                _ => {
                    headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                }
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ytdl_media::MediaError;
    use ytdl_worker::PipelineError;

    #[test]
    fn test_auth_errors_are_401_with_challenge() {
        for err in [
            AuthError::MissingCredential,
            AuthError::InvalidScheme,
            AuthError::InvalidCredential,
        ] {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
        }
    }

    #[test]
    fn test_rate_limited_carries_retry_after() {
        let response = ApiError::from(AuthError::RateLimited {
            retry_after_secs: 3600,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "3600");
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_pipeline_failure_is_422_with_cause() {
        let err = ApiError::from(ExecutorError::Pipeline(PipelineError::Media(
            MediaError::FetchTimeout(900),
        )));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.to_string(),
            "Video processing failed: Video download timed out after 900 seconds"
        );
    }

    #[test]
    fn test_internal_failures_are_opaque() {
        let err = ApiError::from(ExecutorError::Panicked("task 7 panicked".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(ExecutorError::Pipeline(PipelineError::internal(
            "failed to create job workspace",
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_shutting_down_is_503() {
        let err = ApiError::from(ExecutorError::ShuttingDown);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
