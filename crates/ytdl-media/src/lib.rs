//! Media acquisition for the ytdl service.
//!
//! This crate provides:
//! - yt-dlp invocation with timeout and cookie support
//! - Fetched artifact validation
//! - Tool discovery for readiness checks

pub mod command;
pub mod download;
pub mod error;
pub mod validate;

pub use command::{check_ytdlp, ytdlp_version};
pub use download::{FetchConfig, Fetcher, YtDlpFetcher, FORMAT_SELECTOR_1080P};
pub use error::{MediaError, MediaResult};
pub use validate::{validate_file, BYTES_PER_MB, DEFAULT_MAX_FILE_SIZE_MB};
