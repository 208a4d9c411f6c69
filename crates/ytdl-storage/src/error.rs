//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Managed upload failed ({code}): {message}")]
    ManagedUploadFailed { code: String, message: String },

    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("SSL error during upload: {0}")]
    UploadSsl(String),

    #[error("Upload timed out: {0}")]
    UploadTimeout(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("AWS SDK error: {0}")]
    AwsSdk(String),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn managed_upload_failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ManagedUploadFailed {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    /// Check if the error is a configuration problem rather than a runtime failure.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::MissingConfig(_) | Self::ConfigError(_))
    }
}
