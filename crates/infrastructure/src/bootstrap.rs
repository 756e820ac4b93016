//! Wiring of the real adapters into an [`ApiClient`].

use std::sync::Arc;

use datacake_application::ports::TransportError;
use datacake_application::{ApiClient, TokenStore};
use tracing::{info, warn};

use crate::adapters::ReqwestTransport;
use crate::config::ClientConfig;
use crate::hints::EnvHints;
use crate::persistence::FileKeyValueStore;

/// Builds a client from configuration: reqwest transport, file-backed
/// token storage and environment hints.
///
/// Without any data directory the tokens only live in memory.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created.
pub fn build_client(config: &ClientConfig) -> Result<ApiClient, TransportError> {
    let transport = Arc::new(ReqwestTransport::with_timeout(config.request_timeout)?);

    let store = match config.storage_dir() {
        Some(dir) => {
            info!(dir = %dir.display(), "persisting tokens");
            TokenStore::new(Arc::new(FileKeyValueStore::new(dir)))
        }
        None => {
            warn!("no data directory available, tokens will not survive a restart");
            TokenStore::in_memory()
        }
    };

    Ok(ApiClient::new(
        config.resolver_config(),
        store,
        Arc::new(EnvHints::new()),
        transport,
    ))
}
