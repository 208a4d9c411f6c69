//! S3 client implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::retry::{RetryConfig as SdkRetryConfig, RetryMode};
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ServerSideEncryption};
use aws_sdk_s3::Client;
use aws_types::region::Region;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

/// Part size for multipart uploads; files below this go up in one request.
pub const MULTIPART_PART_SIZE: usize = 8 * 1024 * 1024;

/// Attempts made by the SDK for every S3 call.
const SDK_MAX_ATTEMPTS: u32 = 3;

/// Object store operations the uploader depends on.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket the store writes to.
    fn bucket(&self) -> &str;

    /// Upload a file through the SDK's managed path (multipart for large files).
    async fn upload_managed(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Presign a `PutObject` URL with the content type bound into the signature.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Verify the bucket is reachable with the configured credentials.
    async fn check_connectivity(&self) -> StorageResult<()>;
}

/// Normalize an SDK failure into a managed upload error with the provider code.
fn managed_error<E>(err: SdkError<E>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code = err.code().unwrap_or("Unknown").to_string();
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    StorageError::ManagedUploadFailed { code, message }
}

/// Fill `buf` from `file`, returning the number of bytes read (short only at EOF).
async fn read_part(file: &mut tokio::fs::File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// S3 storage client.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from configuration.
    pub fn new(config: StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "ytdl-env",
        );

        let retry_config = SdkRetryConfig::standard()
            .with_max_attempts(SDK_MAX_ATTEMPTS)
            .with_retry_mode(RetryMode::Adaptive);

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .retry_config(retry_config);

        // Path-style addressing is required by most S3-compatible providers
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket_name,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(StorageConfig::from_env()?))
    }

    async fn put_single(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::managed_upload_failed("ReadBody", e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .server_side_encryption(ServerSideEncryption::Aes256)
            .send()
            .await
            .map_err(managed_error)?;

        Ok(())
    }

    async fn put_multipart(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> StorageResult<u32> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .server_side_encryption(ServerSideEncryption::Aes256)
            .send()
            .await
            .map_err(managed_error)?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| StorageError::managed_upload_failed("NoUploadId", "no upload ID returned"))?
            .to_string();

        match self.upload_parts(path, key, &upload_id).await {
            Ok(parts) => Ok(parts),
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!(
                        key = %key,
                        "Failed to abort multipart upload: {}",
                        DisplayErrorContext(&abort_err)
                    );
                }
                Err(e)
            }
        }
    }

    async fn upload_parts(&self, path: &Path, key: &str, upload_id: &str) -> StorageResult<u32> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut buffer = vec![0u8; MULTIPART_PART_SIZE];
        let mut parts = Vec::new();
        let mut part_number = 1i32;

        loop {
            let bytes_in_part = read_part(&mut file, &mut buffer).await?;
            if bytes_in_part == 0 {
                break;
            }

            let uploaded = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(buffer[..bytes_in_part].to_vec()))
                .send()
                .await
                .map_err(managed_error)?;

            let etag = uploaded.e_tag().ok_or_else(|| {
                StorageError::managed_upload_failed(
                    "MissingETag",
                    format!("no ETag returned for part {}", part_number),
                )
            })?;

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .e_tag(etag)
                    .build(),
            );
            debug!(key = %key, part = part_number, bytes = bytes_in_part, "Uploaded part");
            part_number += 1;

            if bytes_in_part < MULTIPART_PART_SIZE {
                break;
            }
        }

        let part_count = parts.len() as u32;
        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(managed_error)?;

        Ok(part_count)
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_managed(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let size = tokio::fs::metadata(path).await?.len();
        debug!("Uploading {} to {} ({} bytes)", path.display(), key, size);

        if size < MULTIPART_PART_SIZE as u64 {
            self.put_single(path, key, content_type).await?;
            info!(bucket = %self.bucket, key = %key, size_bytes = size, "Uploaded object");
        } else {
            let parts = self.put_multipart(path, key, content_type).await?;
            info!(
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                parts,
                "Multipart upload completed"
            );
        }

        Ok(())
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(DisplayErrorContext(&e).to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::AwsSdk(format!(
                    "S3 connectivity check failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}
