//! Artifact validation between fetch and upload.

use std::path::Path;

use tracing::info;

use crate::error::{MediaError, MediaResult};

/// Bytes per megabyte used for the configured size ceiling.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Default size ceiling in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 500;

/// Check that the fetched artifact exists, is non-empty and fits the ceiling.
///
/// Returns the file size in bytes. A file exactly at the limit is accepted.
pub async fn validate_file(path: &Path, max_size_bytes: u64) -> MediaResult<u64> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(MediaError::FileMissing(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MediaError::FileMissing(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let size = metadata.len();
    if size == 0 {
        return Err(MediaError::FileEmpty(path.to_path_buf()));
    }

    if size > max_size_bytes {
        return Err(MediaError::FileTooLarge {
            actual: size,
            limit: max_size_bytes,
        });
    }

    info!(
        "File validation passed: {} ({:.1}MB)",
        path.display(),
        size as f64 / BYTES_PER_MB as f64
    );
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_file(dir: &TempDir, name: &str, len: usize) -> std::path::PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, vec![0u8; len]).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = validate_file(&dir.path().join("nope.mp4"), 1024).await.unwrap_err();
        assert!(matches!(err, MediaError::FileMissing(_)));
    }

    #[tokio::test]
    async fn test_directory_is_missing() {
        let dir = TempDir::new().unwrap();
        let err = validate_file(dir.path(), 1024).await.unwrap_err();
        assert!(matches!(err, MediaError::FileMissing(_)));
    }

    #[tokio::test]
    async fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.mp4", 0).await;
        let err = validate_file(&path, 1024).await.unwrap_err();
        assert!(matches!(err, MediaError::FileEmpty(_)));
    }

    #[tokio::test]
    async fn test_limits() {
        let dir = TempDir::new().unwrap();

        let at_limit = write_file(&dir, "at.mp4", 2048).await;
        assert_eq!(validate_file(&at_limit, 2048).await.unwrap(), 2048);

        let over = write_file(&dir, "over.mp4", 2049).await;
        match validate_file(&over, 2048).await.unwrap_err() {
            MediaError::FileTooLarge { actual, limit } => {
                assert_eq!(actual, 2049);
                assert_eq!(limit, 2048);
            }
            other => panic!("expected FileTooLarge, got {:?}", other),
        }
    }
}
