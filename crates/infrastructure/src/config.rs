//! Startup configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use datacake_application::ResolverConfig;
use datacake_domain::base_url::DEFAULT_API_PORT;
use datacake_domain::{RuntimePlatform, RuntimeTarget};
use tracing::debug;

use crate::adapters::DEFAULT_TIMEOUT;
use crate::persistence::FileKeyValueStore;

/// Explicit backend URL.
pub const API_URL_VAR: &str = "DATACAKE_API_URL";
/// Port of the API on inferred hosts.
pub const API_PORT_VAR: &str = "DATACAKE_API_PORT";
/// `android`, `ios`, `web` or `desktop`.
pub const PLATFORM_VAR: &str = "DATACAKE_PLATFORM";
/// Whether the client runs on real hardware.
pub const PHYSICAL_DEVICE_VAR: &str = "DATACAKE_PHYSICAL_DEVICE";
/// Where tokens are persisted.
pub const DATA_DIR_VAR: &str = "DATACAKE_DATA_DIR";
/// Default request timeout in milliseconds.
pub const REQUEST_TIMEOUT_VAR: &str = "DATACAKE_REQUEST_TIMEOUT_MS";

/// Errors for configuration values that cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set to something unparsable.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// What was expected.
        reason: String,
    },
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Explicit backend URL, if any.
    pub api_url: Option<String>,
    /// API port for inferred hosts.
    pub api_port: u16,
    /// Where the client runs.
    pub runtime: RuntimeTarget,
    /// Configured data directory.
    pub data_dir: Option<PathBuf>,
    /// Default per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_port: DEFAULT_API_PORT,
            runtime: RuntimeTarget::default(),
            data_dir: None,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Loads `.env` when present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => debug!(error = %e, "ignoring unreadable .env"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let api_port = match get(API_PORT_VAR) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: API_PORT_VAR,
                value: raw.clone(),
                reason: "expected a port number".to_string(),
            })?,
            None => DEFAULT_API_PORT,
        };

        let platform = match get(PLATFORM_VAR) {
            Some(raw) => raw
                .parse::<RuntimePlatform>()
                .map_err(|e| ConfigError::InvalidValue {
                    name: PLATFORM_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => RuntimePlatform::default(),
        };
        let physical_device = match get(PHYSICAL_DEVICE_VAR) {
            Some(raw) => parse_bool(PHYSICAL_DEVICE_VAR, &raw)?,
            None => false,
        };

        let request_timeout = match get(REQUEST_TIMEOUT_VAR) {
            Some(raw) => Duration::from_millis(raw.parse().map_err(|_| {
                ConfigError::InvalidValue {
                    name: REQUEST_TIMEOUT_VAR,
                    value: raw.clone(),
                    reason: "expected milliseconds".to_string(),
                }
            })?),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            api_url: get(API_URL_VAR),
            api_port,
            runtime: RuntimeTarget::new(platform, physical_device),
            data_dir: get(DATA_DIR_VAR).map(PathBuf::from),
            request_timeout,
        })
    }

    /// Inputs for the base-URL resolver.
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            override_url: self.api_url.clone(),
            api_port: self.api_port,
            runtime: self.runtime,
            ..ResolverConfig::default()
        }
    }

    /// Directory for persisted tokens: the configured one, else the
    /// platform data directory.
    #[must_use]
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(FileKeyValueStore::default_dir)
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
