//! Source URL safety checks.
//!
//! Rejects URLs that would point yt-dlp at internal services.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::{Host, Url};

/// Maximum URL length.
pub const MAX_URL_LENGTH: usize = 2048;

/// Hostnames of internal and cloud metadata endpoints.
static BLOCKED_HOSTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^localhost\.?$").unwrap(),
        Regex::new(r"\.localhost\.?$").unwrap(),
        Regex::new(r"^metadata(\.|$)").unwrap(),
        Regex::new(r"\.internal\.?$").unwrap(),
    ]
});

/// Why a URL was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlRejection {
    /// Malformed URL or unsupported protocol.
    Invalid(String),
    /// Targets an internal or restricted endpoint.
    Blocked,
    /// Longer than [`MAX_URL_LENGTH`].
    TooLong,
}

impl std::fmt::Display for UrlRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "{}", msg),
            Self::Blocked => write!(f, "URL appears to target an internal or restricted endpoint"),
            Self::TooLong => write!(f, "URL exceeds maximum length of {} characters", MAX_URL_LENGTH),
        }
    }
}

/// Validate a source URL, returning it trimmed.
pub fn validate_source_url(url: &str) -> Result<String, UrlRejection> {
    if url.len() > MAX_URL_LENGTH {
        return Err(UrlRejection::TooLong);
    }

    let url = url.trim();
    if url.is_empty() {
        return Err(UrlRejection::Invalid("URL cannot be empty".to_string()));
    }

    let parsed =
        Url::parse(url).map_err(|e| UrlRejection::Invalid(format!("Invalid URL format: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(UrlRejection::Invalid(format!(
                "Invalid protocol '{}'. Only HTTP and HTTPS are allowed.",
                scheme
            )))
        }
    }

    let blocked = match parsed.host() {
        None => return Err(UrlRejection::Invalid("URL must have a valid host".to_string())),
        Some(Host::Ipv4(ip)) => is_restricted_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_restricted_ip(IpAddr::V6(ip)),
        Some(Host::Domain(domain)) => {
            let domain = domain.to_lowercase();
            BLOCKED_HOSTS.iter().any(|pattern| pattern.is_match(&domain))
        }
    };

    if blocked {
        warn!(url = %url, "Blocked URL targeting restricted endpoint");
        return Err(UrlRejection::Blocked);
    }

    Ok(url.to_string())
}

fn is_restricted_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_restricted_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_restricted_v4(v4),
            None => is_restricted_v6(v6),
        },
    }
}

fn is_restricted_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        // Carrier-grade NAT 100.64.0.0/10
        || (ip.octets()[0] == 100 && (ip.octets()[1] & 0xc0) == 64)
}

fn is_restricted_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // Unique local fc00::/7
        || (first & 0xfe00) == 0xfc00
        // Link local fe80::/10
        || (first & 0xffc0) == 0xfe80
}
