//! Development host inference.
//!
//! Turns loosely formatted hints ("192.168.0.4:8081", "exp://host:19000",
//! "http://localhost:8081/index.bundle?platform=ios") into bare host names
//! that can be combined with the API port. Loopback addresses are
//! translated per platform, and hosts on remote tunnel domains are
//! rejected because a same-network probe can never reach them.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Address under which the Android emulator reaches its host machine.
pub const ANDROID_EMULATOR_HOST: &str = "10.0.2.2";

/// Relay domains that tunnel traffic from outside the local network.
const TUNNEL_DOMAINS: &[&str] = &["exp.host", "exp.direct", "expo.dev"];

#[allow(clippy::expect_used)]
static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z0-9.+-]*://").expect("valid regex"));

#[allow(clippy::expect_used)]
static HOST_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^/?#:]+)").expect("valid regex"));

/// Platform the client runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimePlatform {
    /// Android device or emulator.
    Android,
    /// iOS device or simulator.
    Ios,
    /// Browser build.
    Web,
    /// Desktop or server process.
    #[default]
    Desktop,
}

impl RuntimePlatform {
    /// Returns the platform as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Web => "web",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for RuntimePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimePlatform {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            "web" => Ok(Self::Web),
            "desktop" => Ok(Self::Desktop),
            other => Err(DomainError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Where the client runs: platform plus whether it is physical hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuntimeTarget {
    /// The platform.
    pub platform: RuntimePlatform,
    /// True on real hardware, false on emulators, simulators and desktops.
    pub physical_device: bool,
}

impl RuntimeTarget {
    /// Creates a runtime target.
    #[must_use]
    pub const fn new(platform: RuntimePlatform, physical_device: bool) -> Self {
        Self {
            platform,
            physical_device,
        }
    }

    /// An emulated or simulated runtime for the platform.
    #[must_use]
    pub const fn emulator(platform: RuntimePlatform) -> Self {
        Self::new(platform, false)
    }

    /// A physical device for the platform.
    #[must_use]
    pub const fn device(platform: RuntimePlatform) -> Self {
        Self::new(platform, true)
    }

    /// Web builds are served by the backend's own origin and never infer.
    #[must_use]
    pub const fn infers_hosts(self) -> bool {
        !matches!(self.platform, RuntimePlatform::Web)
    }

    /// Translates loopback names for this runtime.
    ///
    /// Returns `None` if the host cannot reach the developer machine
    /// from here (loopback on a physical device).
    #[must_use]
    pub fn sanitize_host(self, host: &str) -> Option<String> {
        let clean = host.trim();
        if clean.is_empty() {
            return None;
        }

        let lowered = clean.to_lowercase();
        if lowered == "localhost" || lowered == "127.0.0.1" {
            if self.physical_device {
                return None;
            }
            return Some(match self.platform {
                RuntimePlatform::Android => ANDROID_EMULATOR_HOST.to_string(),
                _ => "localhost".to_string(),
            });
        }

        Some(clean.to_string())
    }
}

/// Removes a leading `scheme://` from a hint.
#[must_use]
pub fn strip_scheme(value: &str) -> &str {
    SCHEME_PREFIX
        .find(value)
        .map_or(value, |m| &value[m.end()..])
}

/// Returns true for hosts served through a remote tunnel or relay.
#[must_use]
pub fn is_tunnel_host(host: &str) -> bool {
    let normalized = host.to_lowercase();
    TUNNEL_DOMAINS.iter().any(|domain| {
        normalized == *domain
            || normalized
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Extracts a usable host name from a single hint.
///
/// The port, path, query and fragment are ignored. Tunnel hosts and
/// loopback on physical devices yield `None`.
#[must_use]
pub fn parse_host_candidate(candidate: &str, target: RuntimeTarget) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }

    let without_scheme = strip_scheme(trimmed);
    let normalized = without_scheme.strip_prefix("//").map_or_else(
        || format!("http://{without_scheme}"),
        |rest| format!("http://{rest}"),
    );

    let hostname = Url::parse(&normalized)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .or_else(|| {
            HOST_PREFIX
                .captures(without_scheme)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })?;

    let host = target.sanitize_host(&hostname)?;
    if is_tunnel_host(&host) {
        return None;
    }
    Some(host)
}

/// Parses every hint, dropping unusable ones and duplicates.
///
/// The order of the first occurrence of each host is preserved.
#[must_use]
pub fn collect_host_candidates<S: AsRef<str>>(hints: &[S], target: RuntimeTarget) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for hint in hints {
        if let Some(host) = parse_host_candidate(hint.as_ref(), target) {
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }
    }
    hosts
}
