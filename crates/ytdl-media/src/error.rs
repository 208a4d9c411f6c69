//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors raised by the fetch and validation stages.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("yt-dlp not found: {0}")]
    YtDlpNotFound(String),

    #[error("Video download timed out after {0} seconds")]
    FetchTimeout(u64),

    #[error("Failed to download video: {message}")]
    FetchFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Downloaded file does not exist: {0}")]
    FileMissing(PathBuf),

    #[error("Downloaded file is empty: {0}")]
    FileEmpty(PathBuf),

    #[error("File size ({:.1}MB) exceeds limit ({:.1}MB)", as_mb(.actual), as_mb(.limit))]
    FileTooLarge { actual: u64, limit: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn as_mb(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

impl MediaError {
    /// Create a fetch failure carrying the tool's diagnostic output.
    pub fn fetch_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FetchFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Check if the error came from the fetch stage.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            MediaError::YtDlpNotFound(_) | MediaError::FetchTimeout(_) | MediaError::FetchFailed { .. }
        )
    }

    /// Check if the error came from artifact validation.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            MediaError::FileMissing(_) | MediaError::FileEmpty(_) | MediaError::FileTooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message_reports_both_sizes() {
        let err = MediaError::FileTooLarge {
            actual: 600 * 1024 * 1024,
            limit: 500 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "File size (600.0MB) exceeds limit (500.0MB)");
        assert!(err.is_validation_error());
        assert!(!err.is_fetch_error());
    }

    #[test]
    fn test_timeout_is_fetch_error() {
        let err = MediaError::FetchTimeout(900);
        assert!(err.is_fetch_error());
        assert_eq!(err.to_string(), "Video download timed out after 900 seconds");
    }
}
