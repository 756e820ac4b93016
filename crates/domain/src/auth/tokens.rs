//! Session credentials and partial updates to them.

use serde::{Deserialize, Serialize};

/// The pair of credentials held by a session.
///
/// Either field may be absent independently of the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Short-lived token sent with every authenticated request.
    pub access_token: Option<String>,
    /// Longer-lived token exchanged for a new access token.
    pub refresh_token: Option<String>,
}

impl AuthTokens {
    /// Creates tokens from optional values, treating empty strings as absent.
    #[must_use]
    pub fn new(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: non_empty(access_token),
            refresh_token: non_empty(refresh_token),
        }
    }

    /// Returns true when neither token is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }

    /// Returns a copy with the patch merged in.
    #[must_use]
    pub fn merged(&self, patch: &TokenPatch) -> Self {
        Self {
            access_token: merge_field(self.access_token.as_ref(), patch.access_token.as_ref()),
            refresh_token: merge_field(self.refresh_token.as_ref(), patch.refresh_token.as_ref()),
        }
    }

    /// Formats the `Authorization` header value for the access token, if any.
    #[must_use]
    pub fn bearer_header(&self) -> Option<String> {
        self.access_token
            .as_deref()
            .map(|token| format!("Bearer {token}"))
    }
}

/// A partial update to [`AuthTokens`].
///
/// Each field has three states:
/// - `None`: leave the current value untouched
/// - `Some(None)` or `Some(Some(""))`: clear the value
/// - `Some(Some(token))`: replace the value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPatch {
    /// Update for the access token.
    pub access_token: Option<Option<String>>,
    /// Update for the refresh token.
    pub refresh_token: Option<Option<String>>,
}

impl TokenPatch {
    /// Creates an empty patch that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a patch that replaces both tokens.
    #[must_use]
    pub fn both(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self::new().access(access_token).refresh(refresh_token)
    }

    /// Creates a patch that overwrites both fields with the given tokens.
    #[must_use]
    pub fn replace_with(tokens: &AuthTokens) -> Self {
        Self {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
        }
    }

    /// Creates a patch that clears both tokens.
    #[must_use]
    pub const fn clear_all() -> Self {
        Self {
            access_token: Some(None),
            refresh_token: Some(None),
        }
    }

    /// Sets the access token.
    #[must_use]
    pub fn access(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(Some(token.into()));
        self
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn refresh(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(Some(token.into()));
        self
    }

    /// Clears the access token.
    #[must_use]
    pub fn clear_access(mut self) -> Self {
        self.access_token = Some(None);
        self
    }

    /// Clears the refresh token.
    #[must_use]
    pub fn clear_refresh(mut self) -> Self {
        self.refresh_token = Some(None);
        self
    }

    /// Returns true if the patch leaves both fields untouched.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Get a preview of a token (first 8 chars + ...), safe for logs.
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() > 12 {
        let head: String = token.chars().take(8).collect();
        format!("{head}...")
    } else {
        token.to_string()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn merge_field(current: Option<&String>, update: Option<&Option<String>>) -> Option<String> {
    match update {
        None => current.cloned(),
        Some(next) => non_empty(next.clone()),
    }
}
