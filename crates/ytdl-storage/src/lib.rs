//! Object storage for the ytdl service.
//!
//! Provides:
//! - S3 client with managed (multipart) upload and presigning
//! - Hardened signed-URL transport with retry/backoff
//! - Two-tier uploader combining both

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod transport;
pub mod upload;

pub use client::{ObjectStore, S3Client, MULTIPART_PART_SIZE};
pub use config::{StorageConfig, REQUIRED_VARS};
pub use error::{StorageError, StorageResult};
pub use retry::{retry_async, RetryConfig, RetryResult};
pub use transport::{SignedUrlTransport, TransportConfig};
pub use upload::{UploadMethod, Uploader, PRESIGN_TTL};
