//! Backend base-URL metadata.
//!
//! The resolved base URL always points at the API root and never ends
//! with a `/`, so request paths are joined with a single separator.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Port the backend API listens on in development setups.
pub const DEFAULT_API_PORT: u16 = 8000;

/// Path of the API root on the backend host.
pub const API_ROOT_PATH: &str = "/api";

/// Liveness endpoint, relative to the API root.
pub const HEALTH_PATH: &str = "health/";

/// Host used when nothing better is known.
pub const FALLBACK_HOST: &str = "localhost";

/// Which resolution tier produced the current base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseUrlSource {
    /// Explicit configuration override.
    Env,
    /// Inferred from the development environment.
    Auto,
    /// Confirmed by a network probe.
    AutoProbe,
    /// Loopback default; nothing better was found.
    Fallback,
    /// Set by the user at runtime.
    Manual,
}

impl BaseUrlSource {
    /// Returns the source as its wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Auto => "auto",
            Self::AutoProbe => "auto-probe",
            Self::Fallback => "fallback",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for BaseUrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of how the backend address was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseUrlMeta {
    /// The explicit override, if one was configured.
    pub env_base_url: Option<String>,
    /// The URL inferred from the environment or confirmed by probing.
    pub auto_detected_base_url: Option<String>,
    /// The URL requests are sent to.
    pub resolved_base_url: String,
    /// Which tier produced `resolved_base_url`.
    pub source: BaseUrlSource,
}

impl BaseUrlMeta {
    /// Returns true when the address is the unconfirmed loopback default.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == BaseUrlSource::Fallback
    }
}

/// Removes every trailing `/` from a URL string.
#[must_use]
pub fn strip_trailing_slash(value: &str) -> &str {
    value.trim_end_matches('/')
}

/// Validates a user-supplied base URL and strips trailing separators.
///
/// # Errors
///
/// Returns `DomainError::InvalidUrl` if the value is not an absolute
/// `http`/`https` URL with a host.
pub fn normalize_base_url(raw: &str) -> DomainResult<String> {
    let trimmed = strip_trailing_slash(raw.trim());
    let parsed = Url::parse(trimmed).map_err(|e| DomainError::InvalidUrl(format!("{e}: {raw}")))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(DomainError::InvalidUrl(raw.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Builds the API root URL for a bare host.
#[must_use]
pub fn base_url_for_host(host: &str, port: u16, root_path: &str) -> String {
    let root = strip_trailing_slash(root_path.trim());
    let root = root.trim_start_matches('/');
    if root.is_empty() {
        format!("http://{host}:{port}")
    } else {
        format!("http://{host}:{port}/{root}")
    }
}

/// Returns the liveness endpoint under a base URL.
#[must_use]
pub fn health_url(base_url: &str) -> String {
    format!("{}/{HEALTH_PATH}", strip_trailing_slash(base_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_wire_names() {
        assert_eq!(BaseUrlSource::AutoProbe.to_string(), "auto-probe");
        assert_eq!(
            serde_json::to_string(&BaseUrlSource::Fallback).ok().as_deref(),
            Some("\"fallback\"")
        );
    }

    #[test]
    fn test_normalize_strips_trailing_slash() {
        assert_eq!(
            normalize_base_url(" https://api.example.com/ "),
            Ok("https://api.example.com".to_string())
        );
        assert_eq!(
            normalize_base_url("http://10.0.0.5:8000/api//"),
            Ok("http://10.0.0.5:8000/api".to_string())
        );
    }

    #[test]
    fn test_normalize_rejects_relative_and_odd_schemes() {
        assert!(normalize_base_url("api.example.com").is_err());
        assert!(normalize_base_url("ftp://api.example.com").is_err());
        assert!(normalize_base_url("").is_err());
    }

    #[test]
    fn test_base_url_for_host() {
        assert_eq!(
            base_url_for_host("192.168.0.12", DEFAULT_API_PORT, API_ROOT_PATH),
            "http://192.168.0.12:8000/api"
        );
        assert_eq!(base_url_for_host("h", 9000, "/"), "http://h:9000");
    }

    #[test]
    fn test_health_url() {
        assert_eq!(
            health_url("http://10.0.2.2:8000/api"),
            "http://10.0.2.2:8000/api/health/"
        );
    }
}
