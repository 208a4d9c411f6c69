//! Shared data models for the ytdl service.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers, stages and storage keys
//! - Media container formats
//! - HTTP request/response payloads

pub mod api;
pub mod container;
pub mod job;

// Re-export common types
pub use api::{AsyncDownloadResponse, DownloadRequest, DownloadResponse, GeneratedKeyResponse};
pub use container::{MediaContainer, UnknownContainer};
pub use job::{JobId, JobStage, StorageKey};
