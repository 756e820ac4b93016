//! Application error types

use datacake_domain::{DomainError, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::ports::TransportError;

/// Errors surfaced to callers of the client core.
///
/// `Clone` so that a single refresh failure can be handed to every
/// request that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body as text.
        body: String,
    },

    /// The access token could not be renewed.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The request driving a refresh was dropped before it settled.
    #[error("token refresh was abandoned before it settled")]
    RefreshAbandoned,

    /// A login response lacked the access or refresh token.
    #[error("login response did not include both tokens")]
    IncompleteLogin,

    /// A response body did not have the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}

impl ApiError {
    /// Returns the HTTP status for `Status` errors.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for a final 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status().is_some_and(|s| s.is_unauthorized())
    }

    /// Extracts the message the backend put in an error body.
    ///
    /// Understands a bare JSON string, a `detail` field, and field error
    /// maps (`{"email": ["already taken"]}`), taking the first message.
    /// A non-JSON body is returned as-is.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        if body.trim().is_empty() {
            return None;
        }

        let Ok(data) = serde_json::from_str::<Value>(body) else {
            return Some(body.clone());
        };

        match data {
            Value::String(message) => Some(message),
            Value::Object(map) => {
                if let Some(Value::String(detail)) = map.get("detail") {
                    return Some(detail.clone());
                }
                map.values().next().and_then(|first| match first {
                    Value::Array(items) => items.first().map(value_as_message),
                    Value::String(message) => Some(message.clone()),
                    _ => None,
                })
            }
            _ => None,
        }
    }

    /// The backend message if there is one, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message()
            .unwrap_or_else(|| fallback.to_string())
    }
}

fn value_as_message(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}

/// Result type alias for client operations.
pub type ApiResult<T> = Result<T, ApiError>;
