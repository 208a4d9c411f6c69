//! Bearer authentication and per-credential rate limiting.
//!
//! Provides extractors for handlers:
//! - [`ApiKey`]: valid credential required
//! - [`MeteredApiKey`]: valid credential that also counts against its rate window

mod credentials;
mod rate_window;

pub use credentials::{hash_credential, CredentialSet};
pub use rate_window::RateWindowLimiter;

use std::fmt;
use std::time::Instant;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

/// Default number of random bytes in a generated key.
pub const DEFAULT_KEY_BYTES: usize = 32;

/// Number of hex characters of the credential hash shown in logs.
const FINGERPRINT_LEN: usize = 16;

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Invalid authentication scheme. Use Bearer token")]
    InvalidScheme,

    #[error("Invalid or expired token")]
    InvalidCredential,

    #[error("Rate limit exceeded. Try again later.")]
    RateLimited { retry_after_secs: u64 },
}

/// Log-safe identifier of a credential: a prefix of its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialFingerprint(String);

impl CredentialFingerprint {
    fn from_hash(hash: &str) -> Self {
        Self(hash.chars().take(FINGERPRINT_LEN).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credential set and rate windows, built once at startup.
#[derive(Debug)]
pub struct AuthContext {
    credentials: CredentialSet,
    limiter: RateWindowLimiter,
}

impl AuthContext {
    pub fn new(credentials: CredentialSet, limiter: RateWindowLimiter) -> Self {
        Self {
            credentials,
            limiter,
        }
    }

    pub fn from_env() -> Self {
        Self::new(CredentialSet::from_env(), RateWindowLimiter::from_env())
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    pub fn limiter(&self) -> &RateWindowLimiter {
        &self.limiter
    }

    /// Check the `Authorization` header without touching the rate window.
    pub fn authenticate(&self, header: Option<&str>) -> Result<CredentialFingerprint, AuthError> {
        self.verify(header).map(|hash| CredentialFingerprint::from_hash(&hash))
    }

    /// Check the `Authorization` header and count the request.
    pub fn authorize(&self, header: Option<&str>) -> Result<CredentialFingerprint, AuthError> {
        self.authorize_at(header, Instant::now())
    }

    pub fn authorize_at(
        &self,
        header: Option<&str>,
        now: Instant,
    ) -> Result<CredentialFingerprint, AuthError> {
        let hash = self.verify(header)?;
        let fingerprint = CredentialFingerprint::from_hash(&hash);

        if !self.limiter.check_at(fingerprint.as_str(), now) {
            warn!(fingerprint = %fingerprint, "Rate limit exceeded");
            return Err(AuthError::RateLimited {
                retry_after_secs: self.limiter.window().as_secs(),
            });
        }

        Ok(fingerprint)
    }

    /// Returns the credential hash on success.
    fn verify(&self, header: Option<&str>) -> Result<String, AuthError> {
        let header = header.map(str::trim).filter(|h| !h.is_empty());
        let Some(header) = header else {
            return Err(AuthError::MissingCredential);
        };

        let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::InvalidScheme);
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let hash = hash_credential(token);
        if !self.credentials.contains_hash(&hash) {
            warn!(
                fingerprint = %CredentialFingerprint::from_hash(&hash),
                "Invalid API key attempted"
            );
            return Err(AuthError::InvalidCredential);
        }

        debug!(fingerprint = %CredentialFingerprint::from_hash(&hash), "API key verified");
        Ok(hash)
    }
}

/// Generate a random API key of `num_bytes` bytes, URL-safe base64 without padding.
pub fn generate_api_key(num_bytes: usize) -> String {
    let mut bytes = vec![0u8; num_bytes];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Raw `Authorization` value. Non-UTF8 bytes cannot carry a valid key.
fn authorization_header(parts: &Parts) -> Result<Option<&str>, AuthError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| AuthError::InvalidCredential))
        .transpose()
}

fn record_failure(err: &AuthError) {
    match err {
        AuthError::RateLimited { .. } => metrics::record_rate_limit_hit("credential"),
        _ => metrics::record_auth_failure(err),
    }
}

/// Authenticated caller; not counted against the rate window.
#[derive(Debug, Clone)]
pub struct ApiKey(pub CredentialFingerprint);

#[axum::async_trait]
impl FromRequestParts<AppState> for ApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authorization_header(parts)
            .and_then(|header| state.auth.authenticate(header))
            .map(ApiKey)
            .map_err(|e| {
                record_failure(&e);
                e.into()
            })
    }
}

/// Authenticated caller within its rate window.
#[derive(Debug, Clone)]
pub struct MeteredApiKey(pub CredentialFingerprint);

#[axum::async_trait]
impl FromRequestParts<AppState> for MeteredApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authorization_header(parts)
            .and_then(|header| state.auth.authorize(header))
            .map(MeteredApiKey)
            .map_err(|e| {
                record_failure(&e);
                e.into()
            })
    }
}
