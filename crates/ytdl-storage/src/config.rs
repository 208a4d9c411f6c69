//! Storage configuration.

use crate::error::{StorageError, StorageResult};

/// Variables that must be present before a job may start.
pub const REQUIRED_VARS: [&str; 3] = [
    "AWS_BUCKET_NAME",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
];

/// Configuration for the S3 client.
#[derive(Clone)]
pub struct StorageConfig {
    /// Bucket name
    pub bucket_name: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Region
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket_name", &self.bucket_name)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    ///
    /// Fails with [`StorageError::MissingConfig`] naming every required
    /// variable that is unset or blank.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|name| get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(StorageError::MissingConfig(missing));
        }

        Ok(Self {
            bucket_name: get("AWS_BUCKET_NAME").unwrap_or_default(),
            access_key_id: get("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: get("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            region: get("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            endpoint_url: get("AWS_ENDPOINT_URL"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_all_missing() {
        match StorageConfig::from_lookup(lookup(&[])) {
            Err(StorageError::MissingConfig(vars)) => assert_eq!(vars.len(), 3),
            other => panic!("expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_counts_as_missing() {
        let result = StorageConfig::from_lookup(lookup(&[
            ("AWS_BUCKET_NAME", "videos"),
            ("AWS_ACCESS_KEY_ID", "  "),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]));
        match result {
            Err(StorageError::MissingConfig(vars)) => assert_eq!(vars, vec!["AWS_ACCESS_KEY_ID"]),
            other => panic!("expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let config = StorageConfig::from_lookup(lookup(&[
            ("AWS_BUCKET_NAME", "videos"),
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint_url.is_none());
        let debug = format!("{:?}", config);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("\"secret\""));
    }
}
