//! Application state.

use std::sync::Arc;

use ytdl_media::{FetchConfig, YtDlpFetcher};
use ytdl_worker::{JobExecutor, Pipeline, PipelineConfig, StorageBinding, WorkerConfig};

use crate::auth::AuthContext;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub auth: Arc<AuthContext>,
    pub executor: Arc<JobExecutor>,
    /// yt-dlp binary probed by the readiness check
    pub ytdlp_path: String,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        auth: AuthContext,
        executor: JobExecutor,
        ytdlp_path: impl Into<String>,
    ) -> Self {
        Self {
            config,
            auth: Arc::new(auth),
            executor: Arc::new(executor),
            ytdlp_path: ytdlp_path.into(),
        }
    }

    /// Build state from environment variables.
    ///
    /// Missing storage configuration does not fail startup; download
    /// requests report it instead.
    pub fn from_env(config: ApiConfig) -> Self {
        let fetch_config = FetchConfig::from_env();
        let ytdlp_path = fetch_config.ytdlp_path.clone();
        let pipeline = Pipeline::new(
            PipelineConfig::from_env(fetch_config.container),
            Arc::new(YtDlpFetcher::new(fetch_config)),
            StorageBinding::from_env(),
        );
        let executor = JobExecutor::new(WorkerConfig::from_env(), pipeline);

        Self::new(config, AuthContext::from_env(), executor, ytdlp_path)
    }
}
