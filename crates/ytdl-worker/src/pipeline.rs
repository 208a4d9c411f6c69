//! Fetch → validate → upload pipeline.
//!
//! Each job runs in its own temp workspace under the configured work
//! directory. The workspace is removed when the job ends, whatever the
//! outcome; a panic mid-job still removes it through `Drop`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tempfile::TempDir;
use tracing::{warn, Instrument};
use ytdl_media::{validate_file, FetchConfig, Fetcher, YtDlpFetcher};
use ytdl_models::{JobId, JobStage, StorageKey};
use ytdl_storage::Uploader;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::metrics;

/// Storage availability, resolved once at startup.
///
/// Missing configuration fails each job up front instead of the process.
#[derive(Clone)]
pub enum StorageBinding {
    Ready(Arc<Uploader>),
    Missing(String),
}

impl StorageBinding {
    /// Resolve storage from environment variables.
    pub fn from_env() -> Self {
        match Uploader::from_env() {
            Ok(uploader) => StorageBinding::Ready(Arc::new(uploader)),
            Err(e) => {
                warn!("Storage unavailable, download requests will fail: {}", e);
                StorageBinding::Missing(e.to_string())
            }
        }
    }

    pub fn uploader(&self) -> Option<&Arc<Uploader>> {
        match self {
            StorageBinding::Ready(uploader) => Some(uploader),
            StorageBinding::Missing(_) => None,
        }
    }
}

/// Scoped temp directory for one job.
struct JobWorkspace {
    dir: Option<TempDir>,
}

impl JobWorkspace {
    async fn create(root: &Path) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;
        let dir = tempfile::Builder::new().prefix("ytdl-").tempdir_in(root)?;
        Ok(Self { dir: Some(dir) })
    }

    fn path(&self) -> &Path {
        // Only `release` takes the dir, and it consumes self
        self.dir.as_ref().map(TempDir::path).unwrap_or_else(|| Path::new(""))
    }

    /// Remove the workspace, logging (never returning) failures.
    async fn release(mut self, logger: &JobLogger) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => logger.log_warning(&format!(
                "Failed to remove workspace {}: {}",
                path.display(),
                e
            )),
            Err(e) => logger.log_warning(&format!("Workspace cleanup task failed: {}", e)),
        }
    }
}

/// Pipeline orchestrator.
pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Arc<dyn Fetcher>,
    storage: StorageBinding,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, fetcher: Arc<dyn Fetcher>, storage: StorageBinding) -> Self {
        Self {
            config,
            fetcher,
            storage,
        }
    }

    /// Build the yt-dlp + S3 pipeline from environment variables.
    pub fn from_env() -> Self {
        let fetch_config = FetchConfig::from_env();
        let config = PipelineConfig::from_env(fetch_config.container);
        Self::new(
            config,
            Arc::new(YtDlpFetcher::new(fetch_config)),
            StorageBinding::from_env(),
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn storage(&self) -> &StorageBinding {
        &self.storage
    }

    /// Run a job under a freshly generated id.
    pub async fn run(&self, url: &str) -> PipelineResult<StorageKey> {
        self.run_job(JobId::new(), url).await
    }

    /// Run a job under a caller-allocated id.
    ///
    /// Returns the storage key only when every stage succeeded.
    pub async fn run_job(&self, job_id: JobId, url: &str) -> PipelineResult<StorageKey> {
        let logger = JobLogger::new(&job_id, "download");
        let span = logger.create_span();

        async {
            logger.log_start(url);
            metrics::record_job_started();

            let mut stage = JobStage::ValidatingEnvironment;
            let result = self.execute(&job_id, url, &logger, &mut stage).await;

            match &result {
                Ok(key) => {
                    logger.log_stage(JobStage::Done);
                    logger.log_completion(key.as_str());
                    metrics::record_job_completed();
                }
                Err(e) => {
                    logger.log_error(stage, &e.to_string());
                    logger.log_stage(JobStage::Failed);
                    metrics::record_job_failed(stage);
                }
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        job_id: &JobId,
        url: &str,
        logger: &JobLogger,
        stage: &mut JobStage,
    ) -> PipelineResult<StorageKey> {
        logger.log_stage(*stage);
        let uploader = match &self.storage {
            StorageBinding::Ready(uploader) => Arc::clone(uploader),
            StorageBinding::Missing(reason) => return Err(PipelineError::configuration(reason)),
        };

        let workspace = JobWorkspace::create(&self.config.work_dir)
            .await
            .map_err(|e| PipelineError::internal(format!("failed to create job workspace: {}", e)))?;

        let output = self.output_path(workspace.path(), job_id);
        let result = self
            .stages(job_id, url, &output, &uploader, logger, stage)
            .await;

        workspace.release(logger).await;
        result
    }

    async fn stages(
        &self,
        job_id: &JobId,
        url: &str,
        output: &Path,
        uploader: &Uploader,
        logger: &JobLogger,
        stage: &mut JobStage,
    ) -> PipelineResult<StorageKey> {
        *stage = JobStage::Fetching;
        logger.log_stage(*stage);
        let started = Instant::now();
        self.fetcher.fetch(url, output).await?;
        metrics::record_stage_duration(*stage, started.elapsed().as_secs_f64());

        *stage = JobStage::ValidatingFile;
        logger.log_stage(*stage);
        validate_file(output, self.config.max_file_size_bytes).await?;

        *stage = JobStage::Uploading;
        logger.log_stage(*stage);
        let started = Instant::now();
        let key = StorageKey::for_job(job_id, self.config.container);
        uploader
            .upload(output, key.as_str(), self.config.container.content_type())
            .await?;
        metrics::record_stage_duration(*stage, started.elapsed().as_secs_f64());

        Ok(key)
    }

    fn output_path(&self, workspace: &Path, job_id: &JobId) -> PathBuf {
        workspace.join(format!("{}.{}", job_id, self.config.container.extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workspace_is_removed_on_release() {
        let root = tempfile::TempDir::new().unwrap();
        let logger = JobLogger::new(&JobId::new(), "test");

        let workspace = JobWorkspace::create(root.path()).await.unwrap();
        let path = workspace.path().to_path_buf();
        tokio::fs::write(path.join("partial.mp4"), b"data").await.unwrap();
        assert!(path.starts_with(root.path()));

        workspace.release(&logger).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_workspace_is_removed_on_drop() {
        let root = tempfile::TempDir::new().unwrap();
        let workspace = JobWorkspace::create(root.path()).await.unwrap();
        let path = workspace.path().to_path_buf();

        drop(workspace);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_storage_fails_before_io() {
        struct UnreachableFetcher;

        #[async_trait::async_trait]
        impl Fetcher for UnreachableFetcher {
            async fn fetch(&self, _: &str, _: &Path) -> ytdl_media::MediaResult<()> {
                panic!("fetch must not run without storage");
            }
        }

        let root = tempfile::TempDir::new().unwrap();
        let work_dir = root.path().join("work");
        let pipeline = Pipeline::new(
            PipelineConfig {
                work_dir: work_dir.clone(),
                ..Default::default()
            },
            Arc::new(UnreachableFetcher),
            StorageBinding::Missing("Missing required environment variables: AWS_BUCKET_NAME".into()),
        );

        let err = pipeline.run("https://youtu.be/abc").await.unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(err.to_string().contains("AWS_BUCKET_NAME"));
        assert!(!work_dir.exists());
    }
}
