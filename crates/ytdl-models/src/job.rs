//! Job identity and lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::MediaContainer;

/// Unique identifier for a job.
///
/// Doubles as the temp file stem and the storage key prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object storage key of an uploaded artifact.
///
/// Format: `{job_id}/original.{ext}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive the key for a job's original artifact.
    pub fn for_job(job_id: &JobId, container: MediaContainer) -> Self {
        Self(format!("{}/original.{}", job_id, container.extension()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pipeline stage a job is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    ValidatingEnvironment,
    Fetching,
    ValidatingFile,
    Uploading,
    Done,
    Failed,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::ValidatingEnvironment => "validating_environment",
            JobStage::Fetching => "fetching",
            JobStage::ValidatingFile => "validating_file",
            JobStage::Uploading => "uploading",
            JobStage::Done => "done",
            JobStage::Failed => "failed",
        }
    }

    /// Check if the stage is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Done | JobStage::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_storage_key_layout() {
        let job_id = JobId::from_string("0b6f3c1e-2a44-4d39-9c1b-3f7f0d3d7a10");
        let key = StorageKey::for_job(&job_id, MediaContainer::Mp4);
        assert_eq!(key.as_str(), "0b6f3c1e-2a44-4d39-9c1b-3f7f0d3d7a10/original.mp4");

        let key = StorageKey::for_job(&job_id, MediaContainer::Webm);
        assert!(key.as_str().ends_with("/original.webm"));
    }

    #[test]
    fn test_terminal_stages() {
        assert!(JobStage::Done.is_terminal());
        assert!(JobStage::Failed.is_terminal());
        assert!(!JobStage::Uploading.is_terminal());
        assert_eq!(
            serde_json::to_string(&JobStage::ValidatingFile).unwrap(),
            "\"validating_file\""
        );
    }
}
