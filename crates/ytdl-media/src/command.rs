//! External tool discovery.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Resolve the yt-dlp binary (bare name via PATH, or an explicit path).
pub fn check_ytdlp(ytdlp_path: &str) -> MediaResult<PathBuf> {
    which::which(ytdlp_path).map_err(|e| MediaError::YtDlpNotFound(format!("{}: {}", ytdlp_path, e)))
}

/// Query the installed yt-dlp version.
///
/// Used by readiness checks; bounded so a hung binary can't stall the probe.
pub async fn ytdlp_version(ytdlp_path: &str) -> MediaResult<String> {
    let binary = check_ytdlp(ytdlp_path)?;

    let output = tokio::time::timeout(
        Duration::from_secs(10),
        Command::new(&binary)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| MediaError::FetchTimeout(10))??;

    if !output.status.success() {
        return Err(MediaError::fetch_failed(
            "yt-dlp --version failed",
            Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            output.status.code(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary() {
        let err = check_ytdlp("/definitely/not/here/yt-dlp").unwrap_err();
        assert!(matches!(err, MediaError::YtDlpNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_version_from_fake_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("yt-dlp");
        std::fs::write(&path, "#!/bin/sh\necho 2024.08.06\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let version = ytdlp_version(path.to_str().unwrap()).await.unwrap();
        assert_eq!(version, "2024.08.06");
    }
}
