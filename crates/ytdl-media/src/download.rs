//! Video download using yt-dlp.
//!
//! The fetch stage shells out to yt-dlp with a 1080p ceiling, merges the
//! streams into a single container and enforces a hard wall-clock timeout.
//! Authenticated retrieval is supported through a Netscape cookies file.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};
use ytdl_models::MediaContainer;

use crate::error::{MediaError, MediaResult};

/// Format selector capping resolution at 1080p.
pub const FORMAT_SELECTOR_1080P: &str = "bv*[height<=1080]+ba/b[height<=1080]/b";

/// Default location of the cookies file (mounted read-only in Docker).
pub const DEFAULT_COOKIES_PATH: &str = "/app/cookies/youtube_cookies.txt";

/// Default hard timeout for a single fetch (15 minutes).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(900);

/// Minimum size for a valid cookies file (bytes).
/// A real Netscape cookies file is at least ~50 bytes.
const MIN_COOKIES_FILE_SIZE: u64 = 50;

/// File name of the per-job writable cookies copy.
const JOB_COOKIES_FILE: &str = "cookies.txt";

/// Something that can retrieve a video URL into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into `output_path`.
    ///
    /// On success exactly one file exists at `output_path`. On failure the
    /// file may be missing or partial.
    async fn fetch(&self, url: &str, output_path: &Path) -> MediaResult<()>;
}

/// Fetch stage configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// yt-dlp binary name or path
    pub ytdlp_path: String,
    /// Cookies file passed through when present
    pub cookies_path: PathBuf,
    /// Hard timeout for one invocation
    pub timeout: Duration,
    /// Container to merge into
    pub container: MediaContainer,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            cookies_path: PathBuf::from(DEFAULT_COOKIES_PATH),
            timeout: DEFAULT_FETCH_TIMEOUT,
            container: MediaContainer::Mp4,
        }
    }
}

impl FetchConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let container = match std::env::var("MERGE_OUTPUT_FORMAT") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to mp4", e);
                MediaContainer::Mp4
            }),
            Err(_) => MediaContainer::Mp4,
        };

        Self {
            ytdlp_path: std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string()),
            cookies_path: std::env::var("COOKIE_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_COOKIES_PATH)),
            timeout: Duration::from_secs(
                std::env::var("FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT.as_secs()),
            ),
            container,
        }
    }
}

/// Validate that a cookies file appears to be in Netscape format.
///
/// Netscape cookies files either start with "# Netscape HTTP Cookie File"
/// or contain tab-separated lines with domain entries.
fn is_valid_netscape_cookies(content: &str) -> bool {
    if content.starts_with("# Netscape HTTP Cookie File")
        || content.starts_with("# HTTP Cookie File")
    {
        return true;
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .any(|line| line.split('\t').count() >= 6)
}

/// Copy the cookies file into the job workspace.
///
/// yt-dlp writes cookies back after use, so each job gets its own writable
/// copy instead of sharing the mounted source.
///
/// Returns `None` if the file doesn't exist, is too small, is not in
/// Netscape format, or can't be copied.
pub async fn prepare_job_cookies(source: &Path, workspace: &Path) -> Option<PathBuf> {
    if !source.exists() {
        debug!("Cookies file not found at {}, skipping", source.display());
        return None;
    }

    match tokio::fs::metadata(source).await {
        Ok(metadata) if metadata.len() < MIN_COOKIES_FILE_SIZE => {
            debug!(
                "Cookies file {} is too small ({} bytes), skipping",
                source.display(),
                metadata.len()
            );
            return None;
        }
        Ok(_) => {}
        Err(e) => {
            warn!("Failed to read cookies file metadata: {}", e);
            return None;
        }
    }

    match tokio::fs::read_to_string(source).await {
        Ok(content) if !is_valid_netscape_cookies(&content) => {
            warn!(
                "Cookies file {} is not in valid Netscape format, skipping",
                source.display()
            );
            return None;
        }
        Ok(_) => {}
        Err(e) => {
            warn!("Failed to read cookies file: {}", e);
            return None;
        }
    }

    let target = workspace.join(JOB_COOKIES_FILE);
    if let Err(e) = tokio::fs::copy(source, &target).await {
        warn!("Failed to copy cookies file into job workspace: {}", e);
        return None;
    }

    info!("Using cookies file for authentication");
    Some(target)
}

/// yt-dlp backed fetch stage.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    config: FetchConfig,
}

impl YtDlpFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Build the yt-dlp argument list.
    pub fn build_args(&self, url: &str, output_path: &Path, cookies: Option<&Path>) -> Vec<String> {
        let mut args = vec![
            "--no-warnings".to_string(),
            "--quiet".to_string(),
            "--progress".to_string(),
            "-f".to_string(),
            FORMAT_SELECTOR_1080P.to_string(),
            "--merge-output-format".to_string(),
            self.config.container.extension().to_string(),
            "-o".to_string(),
            output_path.to_string_lossy().to_string(),
        ];

        if let Some(cookies) = cookies {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().to_string());
        }

        // Terminate option parsing so a URL can never be read as a flag
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, output_path: &Path) -> MediaResult<()> {
        let binary = crate::command::check_ytdlp(&self.config.ytdlp_path)?;

        let cookies = match output_path.parent() {
            Some(workspace) => prepare_job_cookies(&self.config.cookies_path, workspace).await,
            None => None,
        };
        let args = self.build_args(url, output_path, cookies.as_deref());

        info!(url = %url, output = %output_path.display(), "Starting download");

        let child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the child on timeout kills the process
        let output = match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                let secs = self.config.timeout.as_secs();
                warn!(url = %url, timeout_secs = secs, "yt-dlp timed out, process killed");
                return Err(MediaError::FetchTimeout(secs));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            debug!("yt-dlp stderr: {}", stderr);
            let error_msg = stderr
                .lines()
                .last()
                .map(str::to_string)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            warn!(url = %url, exit_code = ?output.status.code(), "yt-dlp failed: {}", error_msg);

            return Err(MediaError::fetch_failed(
                error_msg,
                (!stderr.is_empty()).then_some(stderr),
                output.status.code(),
            ));
        }

        if !stderr.is_empty() {
            warn!("yt-dlp warnings: {}", stderr);
        }

        if !output_path.exists() {
            return Err(MediaError::fetch_failed(
                "Output file not created",
                None,
                output.status.code(),
            ));
        }

        info!(output = %output_path.display(), "Video download completed successfully");
        Ok(())
    }
}
