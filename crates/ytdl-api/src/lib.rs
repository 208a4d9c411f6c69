//! Axum HTTP API for the download service.
//!
//! This crate provides:
//! - `POST /download` and `POST /download-async` behind Bearer API keys
//! - Per-key rate windows and a per-IP flood guard
//! - Health, readiness and Prometheus endpoints

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;

pub use auth::{AuthContext, AuthError, CredentialSet, RateWindowLimiter};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
