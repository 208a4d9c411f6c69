//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use ytdl_media::{BYTES_PER_MB, DEFAULT_MAX_FILE_SIZE_MB};
use ytdl_models::MediaContainer;

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Graceful shutdown timeout (drain of in-flight jobs)
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            shutdown_timeout: Duration::from_secs(1800), // 30 minutes
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(3),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
        }
    }
}

/// Per-job pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Size ceiling for fetched artifacts
    pub max_file_size_bytes: u64,
    /// Parent directory for job workspaces
    pub work_dir: PathBuf,
    /// Container the fetch stage merges into
    pub container: MediaContainer,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * BYTES_PER_MB,
            work_dir: std::env::temp_dir(),
            container: MediaContainer::Mp4,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    ///
    /// The container is taken from the fetch configuration so the storage
    /// key extension always matches what yt-dlp produced.
    pub fn from_env(container: MediaContainer) -> Self {
        Self {
            max_file_size_bytes: std::env::var("MAX_FILE_SIZE_MB")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB)
                .saturating_mul(BYTES_PER_MB),
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            container,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let worker = WorkerConfig::default();
        assert_eq!(worker.max_concurrent_jobs, 3);
        assert_eq!(worker.shutdown_timeout, Duration::from_secs(1800));

        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.max_file_size_bytes, 500 * 1024 * 1024);
        assert_eq!(pipeline.container, MediaContainer::Mp4);
    }
}
