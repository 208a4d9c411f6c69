//! Two-tier upload: managed S3 upload first, signed-URL PUT as fallback.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::client::{ObjectStore, S3Client};
use crate::config::StorageConfig;
use crate::error::StorageResult;
use crate::transport::{SignedUrlTransport, TransportConfig};

/// Lifetime of presigned fallback URLs.
pub const PRESIGN_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Metric names emitted by the uploader.
pub mod metric_names {
    pub const UPLOADS_TOTAL: &str = "ytdl_uploads_total";
    pub const UPLOAD_FALLBACKS_TOTAL: &str = "ytdl_upload_fallbacks_total";
    pub const UPLOAD_FAILURES_TOTAL: &str = "ytdl_upload_failures_total";
}

/// Which tier completed the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMethod {
    Managed,
    SignedUrl,
}

impl UploadMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMethod::Managed => "managed",
            UploadMethod::SignedUrl => "signed_url",
        }
    }
}

impl fmt::Display for UploadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upload stage.
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    transport: SignedUrlTransport,
    presign_ttl: Duration,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>, transport: SignedUrlTransport) -> Self {
        Self {
            store,
            transport,
            presign_ttl: PRESIGN_TTL,
        }
    }

    /// Build the S3-backed uploader from configuration.
    pub fn from_config(config: StorageConfig) -> StorageResult<Self> {
        let transport = SignedUrlTransport::new(TransportConfig::for_upload())?;
        Ok(Self::new(Arc::new(S3Client::new(config)), transport))
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_config(StorageConfig::from_env()?)
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Upload `path` under `key`.
    ///
    /// The signed-URL fallback runs at most once, and only after the managed
    /// upload failed. When both fail the fallback's error is returned.
    pub async fn upload(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<UploadMethod> {
        let managed_err = match self.store.upload_managed(path, key, content_type).await {
            Ok(()) => return Ok(self.record_success(key, UploadMethod::Managed)),
            Err(e) => e,
        };

        warn!(
            key = %key,
            bucket = %self.store.bucket(),
            "Managed upload failed, falling back to signed URL: {}",
            managed_err
        );
        metrics::counter!(metric_names::UPLOAD_FALLBACKS_TOTAL).increment(1);

        match self.upload_signed(path, key, content_type).await {
            Ok(()) => Ok(self.record_success(key, UploadMethod::SignedUrl)),
            Err(e) => {
                error!(key = %key, "Signed URL upload failed: {}", e);
                metrics::counter!(metric_names::UPLOAD_FAILURES_TOTAL).increment(1);
                Err(e)
            }
        }
    }

    async fn upload_signed(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let url = self.store.presign_put(key, content_type, self.presign_ttl).await?;
        self.transport.put_file(&url, path, content_type).await
    }

    fn record_success(&self, key: &str, method: UploadMethod) -> UploadMethod {
        info!(key = %key, method = %method, "Upload completed");
        metrics::counter!(metric_names::UPLOADS_TOTAL, "method" => method.as_str()).increment(1);
        method
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::retry::RetryConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Store whose managed path can be told to fail; presigns to a fixed base URL.
    struct FakeStore {
        fail_managed: bool,
        presign_base: String,
        managed_calls: AtomicU32,
        presign_calls: AtomicU32,
    }

    impl FakeStore {
        fn new(fail_managed: bool, presign_base: String) -> Self {
            Self {
                fail_managed,
                presign_base,
                managed_calls: AtomicU32::new(0),
                presign_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        fn bucket(&self) -> &str {
            "test-bucket"
        }

        async fn upload_managed(&self, _: &Path, _: &str, _: &str) -> StorageResult<()> {
            self.managed_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_managed {
                Err(StorageError::managed_upload_failed("AccessDenied", "Access Denied"))
            } else {
                Ok(())
            }
        }

        async fn presign_put(&self, key: &str, _: &str, expires_in: Duration) -> StorageResult<String> {
            assert_eq!(expires_in, PRESIGN_TTL);
            self.presign_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}/{}", self.presign_base, key))
        }

        async fn check_connectivity(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    fn transport() -> SignedUrlTransport {
        SignedUrlTransport::new(TransportConfig {
            retry: RetryConfig::new("test_put").with_base_delay(Duration::from_millis(5)),
            ..TransportConfig::default()
        })
        .unwrap()
    }

    async fn artifact(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("video.mp4");
        tokio::fs::write(&path, vec![1u8; 1024]).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_managed_success_skips_fallback() {
        let store = Arc::new(FakeStore::new(false, "http://unused".to_string()));
        let uploader = Uploader::new(store.clone(), transport());
        let dir = TempDir::new().unwrap();

        let method = uploader
            .upload(&artifact(&dir).await, "job/original.mp4", "video/mp4")
            .await
            .unwrap();

        assert_eq!(method, UploadMethod::Managed);
        assert_eq!(store.presign_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_access_denied_falls_back_once() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(FakeStore::new(true, server.uri()));
        let uploader = Uploader::new(store.clone(), transport());
        let dir = TempDir::new().unwrap();

        let method = uploader
            .upload(&artifact(&dir).await, "job/original.mp4", "video/mp4")
            .await
            .unwrap();

        assert_eq!(method, UploadMethod::SignedUrl);
        assert_eq!(store.managed_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.presign_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_tiers_fail_returns_fallback_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = Arc::new(FakeStore::new(true, server.uri()));
        let uploader = Uploader::new(store.clone(), transport());
        let dir = TempDir::new().unwrap();

        let err = uploader
            .upload(&artifact(&dir).await, "job/original.mp4", "video/mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::UploadFailed(_)), "got {:?}", err);
        assert_eq!(store.presign_calls.load(Ordering::SeqCst), 1);
    }
}
