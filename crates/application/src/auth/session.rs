//! The authenticated session.
//!
//! `AuthSession` is the only owner of the in-memory tokens and of the
//! default `Authorization` header. Everything else reads snapshots.

use datacake_domain::{AuthTokens, TokenPatch, token_preview};
use parking_lot::RwLock;
use tracing::{debug, info};

use super::listeners::{Subscription, UnauthorizedListeners};
use super::token_store::TokenStore;

#[derive(Debug, Default)]
struct SessionState {
    tokens: AuthTokens,
    authorization: Option<String>,
}

impl SessionState {
    fn replace(&mut self, tokens: AuthTokens) {
        self.authorization = tokens.bearer_header();
        self.tokens = tokens;
    }
}

/// Current credentials plus the unauthorized event.
#[derive(Debug)]
pub struct AuthSession {
    store: TokenStore,
    state: RwLock<SessionState>,
    listeners: UnauthorizedListeners,
}

impl AuthSession {
    /// Creates a session, hydrating tokens from the store.
    #[must_use]
    pub fn new(store: TokenStore) -> Self {
        let mut state = SessionState::default();
        if let Some(tokens) = store.get() {
            debug!(
                has_access = tokens.access_token.is_some(),
                has_refresh = tokens.refresh_token.is_some(),
                "hydrated stored session"
            );
            state.replace(tokens);
        }

        Self {
            store,
            state: RwLock::new(state),
            listeners: UnauthorizedListeners::new(),
        }
    }

    /// Snapshot of the current tokens.
    #[must_use]
    pub fn tokens(&self) -> AuthTokens {
        self.state.read().tokens.clone()
    }

    /// Current refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.state.read().tokens.refresh_token.clone()
    }

    /// Value of the default `Authorization` header, if any.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        self.state.read().authorization.clone()
    }

    /// Merges a patch into the current tokens and persists the result.
    pub fn set_tokens(&self, patch: &TokenPatch) {
        let tokens = {
            let mut state = self.state.write();
            let merged = state.tokens.merged(patch);
            state.replace(merged.clone());
            merged
        };

        if tokens.is_empty() {
            self.store.clear();
        } else {
            self.store.put(&TokenPatch::replace_with(&tokens));
        }

        if let Some(access) = tokens.access_token.as_deref() {
            debug!(access = %token_preview(access), "session tokens updated");
        }
    }

    /// Drops both tokens from memory and storage.
    pub fn clear(&self) {
        self.state.write().replace(AuthTokens::default());
        self.store.clear();
    }

    /// Clears the session, then tells every listener it ended.
    pub fn notify_unauthorized(&self) {
        info!("session is no longer authenticated");
        self.clear();
        self.listeners.notify();
    }

    /// Registers a listener for the unauthorized event.
    pub fn subscribe_unauthorized<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }
}
