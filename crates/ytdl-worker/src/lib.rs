//! Download pipeline worker.
//!
//! This crate provides:
//! - Fetch → validate → upload pipeline with per-job workspaces
//! - Bounded job executor with graceful drain
//! - Structured job logging and job metrics

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod pipeline;

pub use config::{PipelineConfig, WorkerConfig};
pub use error::{ExecutorError, PipelineError, PipelineResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use pipeline::{Pipeline, StorageBinding};
