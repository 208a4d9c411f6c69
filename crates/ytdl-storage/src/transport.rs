//! Hardened HTTP transport for signed-URL uploads.
//!
//! A plain `PUT` of the file body to a presigned URL, retried with
//! exponential backoff on throttling, server errors and connection
//! problems. The body is re-opened from disk for every attempt.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use reqwest::{Body, Client, StatusCode};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::retry::{retry_async, RetryConfig, RetryResult};

/// Statuses worth another attempt.
const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Maximum number of response body bytes kept for error messages.
const MAX_ERROR_BODY: usize = 512;

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub retry: RetryConfig,
    pub user_agent: String,
}

impl Default for TransportConfig {
    /// Session defaults: connect 30s, read 300s.
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(300),
            retry: RetryConfig::new("signed_url_put"),
            user_agent: format!("ytdl-service/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    /// Timeouts for large file bodies: connect 60s, read 600s.
    pub fn for_upload() -> Self {
        Self {
            connect_timeout: Duration::from_secs(60),
            read_timeout: Duration::from_secs(600),
            ..Default::default()
        }
    }
}

/// Failure of a single PUT attempt.
#[derive(Debug, Error)]
enum AttemptError {
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to open upload body: {0}")]
    Io(#[from] std::io::Error),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
            AttemptError::Transport(e) => {
                (e.is_connect() || e.is_timeout()) && !is_tls_error(e)
            }
            AttemptError::Io(_) => false,
        }
    }

    fn into_storage_error(self, attempts: u32) -> StorageError {
        match self {
            AttemptError::Status { status, body } => StorageError::UploadFailed(format!(
                "signed URL upload returned {} after {} attempt(s): {}",
                status, attempts, body
            )),
            AttemptError::Transport(e) if is_tls_error(&e) => StorageError::UploadSsl(e.to_string()),
            AttemptError::Transport(e) if e.is_timeout() => StorageError::UploadTimeout(format!(
                "{} (after {} attempt(s))",
                e, attempts
            )),
            AttemptError::Transport(e) => StorageError::UploadFailed(format!(
                "{} (after {} attempt(s))",
                e, attempts
            )),
            AttemptError::Io(e) => StorageError::Io(e),
        }
    }
}

/// Walk the error chain below the request error looking for a TLS failure.
///
/// The top-level `reqwest::Error` renders the request URL, so text matching
/// starts at its source.
fn is_tls_error(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);

    while let Some(e) = source {
        if e.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        // io::Error hides its payload from source()
        if let Some(inner) = e.downcast_ref::<std::io::Error>().and_then(|io| io.get_ref()) {
            if inner.downcast_ref::<rustls::Error>().is_some() {
                return true;
            }
        }
        let msg = e.to_string().to_lowercase();
        if msg.contains("certificate") || msg.contains("tls") || msg.contains("ssl") {
            return true;
        }
        source = e.source();
    }

    false
}

/// HTTP client for presigned PUT uploads.
#[derive(Debug, Clone)]
pub struct SignedUrlTransport {
    client: Client,
    config: TransportConfig,
}

impl SignedUrlTransport {
    pub fn new(config: TransportConfig) -> StorageResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|e| StorageError::config_error(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// PUT the file at `path` to a presigned URL.
    pub async fn put_file(&self, url: &str, path: &Path, content_type: &str) -> StorageResult<()> {
        let size = tokio::fs::metadata(path).await?.len();
        debug!("PUT {} bytes to signed URL", size);

        let result = retry_async(
            &self.config.retry,
            || self.put_once(url, path, content_type, size),
            AttemptError::is_retryable,
        )
        .await;

        match result {
            RetryResult::Success(()) => {
                info!(size_bytes = size, "Signed URL upload completed");
                Ok(())
            }
            RetryResult::Failed { error, attempts } => Err(error.into_storage_error(attempts)),
        }
    }

    async fn put_once(
        &self,
        url: &str,
        path: &Path,
        content_type: &str,
        size: u64,
    ) -> Result<(), AttemptError> {
        let file = tokio::fs::File::open(path).await?;
        let body = Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, size)
            .header(USER_AGENT, &self.config.user_agent)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut end = MAX_ERROR_BODY;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }
        Err(AttemptError::Status { status, body })
    }
}
