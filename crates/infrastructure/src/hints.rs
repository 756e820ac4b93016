//! Environment hint providers.
//!
//! A desktop or CLI host has no bundler to ask where the development
//! server runs, so the same information is read from environment
//! variables instead.

use std::collections::HashMap;

use datacake_application::ports::EnvironmentHints;

/// URL the app bundle was served from.
pub const DEV_SERVER_URL_VAR: &str = "DATACAKE_DEV_SERVER_URL";
/// Address of the attached debugger.
pub const DEBUGGER_HOST_VAR: &str = "DATACAKE_DEBUGGER_HOST";
/// Host URI reported by the development tooling.
pub const HOST_URI_VAR: &str = "DATACAKE_HOST_URI";

/// Hint variables in priority order.
pub const HINT_VARS: [&str; 3] = [DEV_SERVER_URL_VAR, DEBUGGER_HOST_VAR, HOST_URI_VAR];

/// Hints read from environment variables at the time they are asked for.
#[derive(Debug, Clone, Default)]
pub struct EnvHints {
    overrides: Option<HashMap<String, String>>,
}

impl EnvHints {
    /// Reads the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads from a fixed map instead of the process environment.
    #[must_use]
    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self {
            overrides: Some(values),
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match &self.overrides {
            Some(values) => values.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }
}

impl EnvironmentHints for EnvHints {
    fn host_candidates(&self) -> Vec<String> {
        HINT_VARS
            .iter()
            .filter_map(|name| self.lookup(name))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }
}
