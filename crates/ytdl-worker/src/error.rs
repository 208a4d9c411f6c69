//! Worker error types.

use thiserror::Error;
use ytdl_media::MediaError;
use ytdl_storage::StorageError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// A job failure, normalized across stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Storage is not configured: {0}")]
    Configuration(String),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Failures that are not the caller's input or an upstream service.
    ///
    /// These are reported without detail.
    pub fn is_internal(&self) -> bool {
        matches!(self, PipelineError::Internal(_))
    }
}

/// Errors from submitting work to the executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Executor is shutting down, not accepting new jobs")]
    ShuttingDown,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Job panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_errors_keep_their_message() {
        let err: PipelineError = MediaError::FetchTimeout(900).into();
        assert_eq!(err.to_string(), "Video download timed out after 900 seconds");
        assert!(!err.is_internal());

        let err = PipelineError::internal("workspace creation failed");
        assert!(err.is_internal());
    }
}
