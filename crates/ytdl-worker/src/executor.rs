//! Job executor.
//!
//! Runs pipelines on spawned tasks behind a semaphore. A job keeps running
//! when the request that submitted it goes away.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use ytdl_models::{JobId, StorageKey};

use crate::config::WorkerConfig;
use crate::error::{ExecutorError, PipelineError, PipelineResult};
use crate::metrics;
use crate::pipeline::Pipeline;

/// Decrements the in-flight count when a job task ends, even by panic.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_in_flight(now);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.0.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_in_flight(now);
    }
}

/// Bounded executor for pipeline jobs.
pub struct JobExecutor {
    config: WorkerConfig,
    pipeline: Arc<Pipeline>,
    job_semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    shutting_down: AtomicBool,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig, pipeline: Pipeline) -> Self {
        info!(
            "Starting job executor with {} max concurrent jobs",
            config.max_concurrent_jobs
        );
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));

        Self {
            config,
            pipeline: Arc::new(pipeline),
            job_semaphore,
            in_flight: Arc::new(AtomicUsize::new(0)),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Jobs submitted and not yet finished (running or waiting for a slot).
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Run a job and wait for its result.
    pub async fn submit(&self, url: &str) -> Result<StorageKey, ExecutorError> {
        let job_id = JobId::new();
        let handle = self.spawn_job(job_id, url)?;

        match handle.await {
            Ok(result) => result.map_err(ExecutorError::from),
            Err(e) => {
                error!("Job task failed: {}", e);
                Err(ExecutorError::Panicked(e.to_string()))
            }
        }
    }

    /// Start a job without waiting for it. The outcome is only logged.
    pub fn submit_detached(&self, url: &str) -> Result<JobId, ExecutorError> {
        let job_id = JobId::new();
        let handle = self.spawn_job(job_id.clone(), url)?;

        let watched_id = job_id.clone();
        tokio::spawn(async move {
            if let Err(e) = handle.await {
                error!(job_id = %watched_id, "Background job task failed: {}", e);
            }
        });

        Ok(job_id)
    }

    fn spawn_job(
        &self,
        job_id: JobId,
        url: &str,
    ) -> Result<JoinHandle<PipelineResult<StorageKey>>, ExecutorError> {
        if self.is_shutting_down() {
            metrics::record_job_rejected();
            return Err(ExecutorError::ShuttingDown);
        }

        let guard = InFlightGuard::acquire(&self.in_flight);
        let pipeline = Arc::clone(&self.pipeline);
        let semaphore = Arc::clone(&self.job_semaphore);
        let url = url.to_string();

        Ok(tokio::spawn(async move {
            let _guard = guard;
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::internal("executor closed"))?;
            pipeline.run_job(job_id, &url).await
        }))
    }

    /// Stop accepting jobs and wait for in-flight ones.
    ///
    /// Returns `false` if jobs were still running when the timeout expired.
    pub async fn shutdown(&self) -> bool {
        self.shutting_down.store(true, Ordering::SeqCst);
        info!("Waiting for {} in-flight jobs to complete...", self.in_flight());

        match tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await {
            Ok(()) => {
                info!("Job executor stopped");
                true
            }
            Err(_) => {
                warn!(
                    "Shutdown timeout after {:?}, {} jobs still running",
                    self.config.shutdown_timeout,
                    self.in_flight()
                );
                false
            }
        }
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        while self.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::StorageBinding;
    use async_trait::async_trait;
    use std::path::Path;
    use ytdl_media::{Fetcher, MediaError, MediaResult};

    /// Fetcher that tracks concurrency, sleeps, then fails.
    struct SlowFetcher {
        delay: Duration,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for SlowFetcher {
        async fn fetch(&self, _: &str, _: &Path) -> MediaResult<()> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Err(MediaError::fetch_failed("ERROR: Video unavailable", None, Some(1)))
        }
    }

    struct PanickingFetcher;

    #[async_trait]
    impl Fetcher for PanickingFetcher {
        async fn fetch(&self, _: &str, _: &Path) -> MediaResult<()> {
            panic!("fetcher exploded");
        }
    }

    fn executor(fetcher: Arc<dyn Fetcher>, work_dir: &Path, max_jobs: usize) -> JobExecutor {
        // A Ready binding needs real S3 config; these tests never reach upload.
        let uploader = ytdl_storage::Uploader::from_config(ytdl_storage::StorageConfig {
            bucket_name: "videos".to_string(),
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: Some("http://127.0.0.1:9".to_string()),
        })
        .unwrap();

        JobExecutor::new(
            WorkerConfig {
                max_concurrent_jobs: max_jobs,
                shutdown_timeout: Duration::from_secs(5),
            },
            Pipeline::new(
                PipelineConfig {
                    work_dir: work_dir.to_path_buf(),
                    ..Default::default()
                },
                fetcher,
                StorageBinding::Ready(Arc::new(uploader)),
            ),
        )
    }

    fn slow_fetcher(delay: Duration) -> Arc<SlowFetcher> {
        Arc::new(SlowFetcher {
            delay,
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let root = tempfile::TempDir::new().unwrap();
        let fetcher = slow_fetcher(Duration::from_millis(100));
        let executor = Arc::new(executor(fetcher.clone(), root.path(), 2));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let executor = Arc::clone(&executor);
            handles.push(tokio::spawn(async move {
                executor.submit("https://youtu.be/abc").await
            }));
        }
        for handle in handles {
            let result = handle.await.unwrap();
            assert!(matches!(
                result,
                Err(ExecutorError::Pipeline(PipelineError::Media(MediaError::FetchFailed { .. })))
            ));
        }

        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 2);
        assert_eq!(executor.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_panicking_job_is_reported() {
        let root = tempfile::TempDir::new().unwrap();
        let executor = executor(Arc::new(PanickingFetcher), root.path(), 1);

        let err = executor.submit("https://youtu.be/abc").await.unwrap_err();
        assert!(matches!(err, ExecutorError::Panicked(_)));
        assert_eq!(executor.in_flight(), 0);

        // Workspace removed by Drop during unwinding
        let leftovers = std::fs::read_dir(root.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_and_rejects() {
        let root = tempfile::TempDir::new().unwrap();
        let executor = executor(slow_fetcher(Duration::from_millis(200)), root.path(), 1);

        executor.submit_detached("https://youtu.be/abc").unwrap();
        assert_eq!(executor.in_flight(), 1);

        assert!(executor.shutdown().await);
        assert_eq!(executor.in_flight(), 0);

        assert!(matches!(
            executor.submit("https://youtu.be/abc").await,
            Err(ExecutorError::ShuttingDown)
        ));
        assert!(matches!(
            executor.submit_detached("https://youtu.be/abc"),
            Err(ExecutorError::ShuttingDown)
        ));
    }
}
