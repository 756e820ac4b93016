//! Backend base-URL resolution.
//!
//! The resolver settles on an address synchronously at construction,
//! from an explicit override, an address inferred from development hints,
//! or the loopback fallback. When it had to fall back, a later call to
//! [`BaseUrlResolver::ensure_resolved`] probes every hinted host and
//! upgrades the address to the first one whose liveness endpoint answers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use datacake_domain::base_url::{
    API_ROOT_PATH, DEFAULT_API_PORT, FALLBACK_HOST, base_url_for_host, health_url,
    normalize_base_url,
};
use datacake_domain::host::collect_host_candidates;
use datacake_domain::{BaseUrlMeta, BaseUrlSource, DomainResult, HttpMethod, RuntimeTarget};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::ports::{EnvironmentHints, HttpTransport, TransportRequest};

/// Hard limit for each liveness check.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Static inputs of base-URL resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Explicit backend URL; wins over everything when non-blank.
    pub override_url: Option<String>,
    /// Port the API listens on for inferred hosts.
    pub api_port: u16,
    /// Root path of the API on inferred hosts.
    pub root_path: String,
    /// Where the client runs.
    pub runtime: RuntimeTarget,
    /// Timeout for each probe.
    pub probe_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            override_url: None,
            api_port: DEFAULT_API_PORT,
            root_path: API_ROOT_PATH.to_string(),
            runtime: RuntimeTarget::default(),
            probe_timeout: PROBE_TIMEOUT,
        }
    }
}

/// How a call to [`BaseUrlResolver::ensure_resolved`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Nothing to do; the address did not come from the fallback tier.
    AlreadyResolved,
    /// A probe found a reachable host.
    Discovered,
    /// No hinted host answered; the fallback address is still in use.
    Unreachable,
}

/// Outcome of [`BaseUrlResolver::ensure_resolved`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrlResolution {
    /// Metadata after the call.
    pub meta: BaseUrlMeta,
    /// What the call did.
    pub status: ProbeStatus,
}

impl BaseUrlResolution {
    /// True when automatic discovery failed and the user should
    /// configure the address manually.
    #[must_use]
    pub fn discovery_failed(&self) -> bool {
        self.status == ProbeStatus::Unreachable
    }
}

/// Owner of the current [`BaseUrlMeta`].
pub struct BaseUrlResolver {
    config: ResolverConfig,
    hints: Arc<dyn EnvironmentHints>,
    transport: Arc<dyn HttpTransport>,
    meta: RwLock<BaseUrlMeta>,
    probe_lock: tokio::sync::Mutex<()>,
    completed_sweeps: AtomicU64,
    last_sweep: Mutex<Option<ProbeStatus>>,
}

impl std::fmt::Debug for BaseUrlResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseUrlResolver")
            .field("config", &self.config)
            .field("meta", &*self.meta.read())
            .finish_non_exhaustive()
    }
}

impl BaseUrlResolver {
    /// Resolves the initial address from static evidence.
    #[must_use]
    pub fn new(
        config: ResolverConfig,
        hints: Arc<dyn EnvironmentHints>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let meta = initial_meta(&config, hints.as_ref());

        Self {
            config,
            hints,
            transport,
            meta: RwLock::new(meta),
            probe_lock: tokio::sync::Mutex::new(()),
            completed_sweeps: AtomicU64::new(0),
            last_sweep: Mutex::new(None),
        }
    }

    /// Snapshot of the current metadata.
    #[must_use]
    pub fn meta(&self) -> BaseUrlMeta {
        self.meta.read().clone()
    }

    /// The URL requests are currently sent to.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.meta.read().resolved_base_url.clone()
    }

    /// Replaces the address with one supplied by the user.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` if `url` is not an absolute
    /// http(s) URL.
    pub fn set_manual(&self, url: &str) -> DomainResult<BaseUrlMeta> {
        let normalized = normalize_base_url(url)?;
        let mut meta = self.meta.write();
        meta.resolved_base_url = normalized;
        meta.source = BaseUrlSource::Manual;
        info!(base_url = %meta.resolved_base_url, "API base URL set manually");
        Ok(meta.clone())
    }

    /// Probes hinted hosts when the address is still the fallback.
    ///
    /// Concurrent callers share a single probe sweep and all observe
    /// its outcome.
    pub async fn ensure_resolved(&self) -> BaseUrlResolution {
        if !self.meta.read().is_fallback() {
            return self.resolution(ProbeStatus::AlreadyResolved);
        }

        let observed = self.completed_sweeps.load(Ordering::SeqCst);
        let _sweep = self.probe_lock.lock().await;

        if self.completed_sweeps.load(Ordering::SeqCst) != observed {
            let status = (*self.last_sweep.lock()).unwrap_or(ProbeStatus::AlreadyResolved);
            return self.resolution(status);
        }
        if !self.meta.read().is_fallback() {
            return self.resolution(ProbeStatus::AlreadyResolved);
        }

        let status = match self.probe().await {
            Some(base_url) => {
                self.promote(base_url);
                ProbeStatus::Discovered
            }
            None => {
                warn!(
                    "could not reach the API automatically; configure the backend URL manually"
                );
                ProbeStatus::Unreachable
            }
        };

        *self.last_sweep.lock() = Some(status);
        self.completed_sweeps.fetch_add(1, Ordering::SeqCst);
        self.resolution(status)
    }

    fn resolution(&self, status: ProbeStatus) -> BaseUrlResolution {
        BaseUrlResolution {
            meta: self.meta(),
            status,
        }
    }

    fn promote(&self, base_url: String) {
        let mut meta = self.meta.write();
        info!(base_url = %base_url, "API base URL discovered by probing");
        meta.auto_detected_base_url = Some(base_url.clone());
        meta.resolved_base_url = base_url;
        meta.source = BaseUrlSource::AutoProbe;
    }

    async fn probe(&self) -> Option<String> {
        let hosts = collect_host_candidates(&self.hints.host_candidates(), self.config.runtime);
        debug!(candidates = ?hosts, "probing for a reachable API");

        for host in hosts {
            let base_url = base_url_for_host(&host, self.config.api_port, &self.config.root_path);
            let Ok(url) = Url::parse(&health_url(&base_url)) else {
                debug!(host = %host, "skipping unparsable probe URL");
                continue;
            };

            let mut request = TransportRequest::new(HttpMethod::Get, url);
            request.timeout = Some(self.config.probe_timeout);

            match tokio::time::timeout(self.config.probe_timeout, self.transport.execute(request))
                .await
            {
                Ok(Ok(response)) if response.status.is_success() => return Some(base_url),
                Ok(Ok(response)) => {
                    debug!(host = %host, status = %response.status, "probe answered without success");
                }
                Ok(Err(e)) => debug!(host = %host, error = %e, "probe failed"),
                Err(_) => debug!(host = %host, "probe timed out"),
            }
        }

        None
    }
}

fn initial_meta(config: &ResolverConfig, hints: &dyn EnvironmentHints) -> BaseUrlMeta {
    let env_base_url = config
        .override_url
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| match normalize_base_url(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, "ignoring invalid API URL override");
                None
            }
        });

    let auto_detected_base_url = if config.runtime.infers_hosts() {
        collect_host_candidates(&hints.host_candidates(), config.runtime)
            .first()
            .map(|host| base_url_for_host(host, config.api_port, &config.root_path))
    } else {
        None
    };

    let (resolved_base_url, source) = match (&env_base_url, &auto_detected_base_url) {
        (Some(url), _) => (url.clone(), BaseUrlSource::Env),
        (None, Some(url)) => (url.clone(), BaseUrlSource::Auto),
        (None, None) => (
            base_url_for_host(FALLBACK_HOST, config.api_port, &config.root_path),
            BaseUrlSource::Fallback,
        ),
    };

    if env_base_url.is_none() && config.runtime.infers_hosts() {
        if source == BaseUrlSource::Auto {
            info!(base_url = %resolved_base_url, "API base URL inferred from the dev environment");
        } else {
            warn!("could not detect the backend address; set an API URL override or serve on the LAN");
        }
    }

    BaseUrlMeta {
        env_base_url,
        auto_detected_base_url,
        resolved_base_url,
        source,
    }
}
