//! Credential set loaded from the environment.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// Hex SHA-256 digest of a raw credential.
pub fn hash_credential(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

/// Hashed API keys accepted by the service.
///
/// Raw keys are hashed on load and never kept.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    hashes: HashSet<String>,
}

impl CredentialSet {
    /// Load from `API_KEY`, `API_KEY_1..N` (up to the first gap) and `API_KEYS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let mut hashes = HashSet::new();

        if let Some(primary) = get("API_KEY") {
            hashes.insert(hash_credential(&primary));
        }

        for key in (1..).map_while(|i| get(&format!("API_KEY_{}", i))) {
            hashes.insert(hash_credential(&key));
        }

        if let Some(csv) = get("API_KEYS") {
            hashes.extend(
                csv.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(hash_credential),
            );
        }

        let set = Self { hashes };
        set.log_loaded();
        set
    }

    /// Build from raw keys.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hashes: keys.into_iter().map(|k| hash_credential(k.as_ref())).collect(),
        }
    }

    fn log_loaded(&self) {
        if self.hashes.is_empty() {
            warn!("No API keys configured! All requests will be rejected.");
        } else {
            info!("Loaded {} API key(s)", self.hashes.len());
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn contains_hash(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
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
    fn test_hash_is_hex_sha256() {
        assert_eq!(
            hash_credential("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_loads_all_sources() {
        let set = CredentialSet::from_lookup(lookup(&[
            ("API_KEY", "primary"),
            ("API_KEY_1", "one"),
            ("API_KEY_2", "two"),
            ("API_KEYS", " three , ,four"),
        ]));

        assert_eq!(set.len(), 5);
        for key in ["primary", "one", "two", "three", "four"] {
            assert!(set.contains_hash(&hash_credential(key)), "missing {}", key);
        }
    }

    #[test]
    fn test_numbered_keys_stop_at_first_gap() {
        let set = CredentialSet::from_lookup(lookup(&[
            ("API_KEY_1", "one"),
            ("API_KEY_3", "three"),
        ]));

        assert_eq!(set.len(), 1);
        assert!(!set.contains_hash(&hash_credential("three")));
    }

    #[test]
    fn test_empty_set() {
        let set = CredentialSet::from_lookup(lookup(&[("API_KEY", "")]));
        assert!(set.is_empty());
    }
}
