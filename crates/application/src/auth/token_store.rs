//! Durable token storage with an in-memory fallback.
//!
//! Tokens are written as raw strings under two fixed keys. When the
//! durable backend fails, the store keeps working from an in-process map
//! for the rest of the process lifetime and only logs the failure.

use std::collections::HashMap;
use std::sync::Arc;

use datacake_domain::{AuthTokens, TokenPatch};
use parking_lot::Mutex;
use tracing::warn;

use crate::ports::KeyValueStore;

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "datacake.access_token";

/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "datacake.refresh_token";

/// Token persistence that never fails its caller.
#[derive(Clone)]
pub struct TokenStore {
    durable: Option<Arc<dyn KeyValueStore>>,
    fallback: Arc<Mutex<HashMap<String, String>>>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("durable", &self.durable.is_some())
            .finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Create a store backed by durable storage.
    #[must_use]
    pub fn new(durable: Arc<dyn KeyValueStore>) -> Self {
        Self {
            durable: Some(durable),
            fallback: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a store that only lives in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            durable: None,
            fallback: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the stored tokens, or `None` when neither is present.
    #[must_use]
    pub fn get(&self) -> Option<AuthTokens> {
        let tokens = AuthTokens::new(self.read(ACCESS_TOKEN_KEY), self.read(REFRESH_TOKEN_KEY));
        if tokens.is_empty() { None } else { Some(tokens) }
    }

    /// Persists the fields the patch defines.
    ///
    /// Untouched fields keep their stored value; cleared fields are removed.
    pub fn put(&self, patch: &TokenPatch) {
        if let Some(access) = &patch.access_token {
            self.write(ACCESS_TOKEN_KEY, access.as_deref());
        }
        if let Some(refresh) = &patch.refresh_token {
            self.write(REFRESH_TOKEN_KEY, refresh.as_deref());
        }
    }

    /// Removes both tokens.
    pub fn clear(&self) {
        self.write(ACCESS_TOKEN_KEY, None);
        self.write(REFRESH_TOKEN_KEY, None);
    }

    fn read(&self, key: &str) -> Option<String> {
        if let Some(durable) = &self.durable {
            match durable.get(key) {
                Ok(value) => return value.filter(|v| !v.is_empty()),
                Err(e) => warn!(key, error = %e, "token storage read failed, using memory"),
            }
        }
        self.fallback.lock().get(key).cloned()
    }

    fn write(&self, key: &str, value: Option<&str>) {
        let value = value.filter(|v| !v.is_empty());

        if let Some(durable) = &self.durable {
            let result = match value {
                Some(v) => durable.set(key, v),
                None => durable.remove(key),
            };
            match result {
                Ok(()) => return,
                Err(e) => warn!(key, error = %e, "token storage write failed, using memory"),
            }
        }

        let mut fallback = self.fallback.lock();
        match value {
            Some(v) => {
                fallback.insert(key.to_string(), v.to_string());
            }
            None => {
                fallback.remove(key);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::{FailingStore, MemoryStore};
    use pretty_assertions::assert_eq;

    fn tokens(access: &str, refresh: &str) -> AuthTokens {
        AuthTokens::new(Some(access.to_string()), Some(refresh.to_string()))
    }

    #[test]
    fn test_get_empty_is_none() {
        let store = TokenStore::new(Arc::new(MemoryStore::default()));
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_put_writes_raw_values_under_fixed_keys() {
        let backend = Arc::new(MemoryStore::default());
        let store = TokenStore::new(backend.clone());

        store.put(&TokenPatch::both("acc", "ref"));

        assert_eq!(backend.value(ACCESS_TOKEN_KEY).as_deref(), Some("acc"));
        assert_eq!(backend.value(REFRESH_TOKEN_KEY).as_deref(), Some("ref"));
        assert_eq!(store.get(), Some(tokens("acc", "ref")));
    }

    #[test]
    fn test_put_leaves_untouched_field() {
        let store = TokenStore::new(Arc::new(MemoryStore::default()));
        store.put(&TokenPatch::both("a0", "r0"));

        store.put(&TokenPatch::new().access("a1"));
        assert_eq!(store.get(), Some(tokens("a1", "r0")));

        store.put(&TokenPatch::new().clear_access());
        assert_eq!(
            store.get(),
            Some(AuthTokens::new(None, Some("r0".to_string())))
        );
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let backend = Arc::new(MemoryStore::default());
        let store = TokenStore::new(backend.clone());
        store.put(&TokenPatch::both("a", "r"));

        store.clear();

        assert_eq!(store.get(), None);
        assert!(!backend.contains(ACCESS_TOKEN_KEY));
        assert!(!backend.contains(REFRESH_TOKEN_KEY));
    }

    #[test]
    fn test_failing_backend_degrades_to_memory() {
        let store = TokenStore::new(Arc::new(FailingStore));

        store.put(&TokenPatch::both("a", "r"));
        assert_eq!(store.get(), Some(tokens("a", "r")));

        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_in_memory_store() {
        let store = TokenStore::in_memory();
        store.put(&TokenPatch::new().refresh("r"));
        assert_eq!(store.get(), Some(AuthTokens::new(None, Some("r".to_string()))));
    }
}
