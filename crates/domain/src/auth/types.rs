//! Authentication payloads exchanged with the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username or email.
    pub identifier: String,
    /// Plain password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }
}

/// Token issuance response.
///
/// Both fields are optional on the wire; a login response missing
/// either one is rejected by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token.
    #[serde(default)]
    pub access: Option<String>,
    /// Refresh token.
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Body of a token refresh call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token being exchanged.
    pub refresh: String,
}

/// Response of a token refresh call.
///
/// `refresh` is only present when the backend rotates refresh tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token.
    #[serde(default)]
    pub access: Option<String>,
    /// Rotated refresh token.
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Profile of the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend identifier.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Any other fields the backend returns.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Account registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
}

/// Body carrying only an email address (resend code, password reset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Email address.
    pub email: String,
}

/// Email verification with the code sent to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVerification {
    /// Email address.
    pub email: String,
    /// Verification code.
    pub code: String,
}

/// Password reset confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetConfirmation {
    /// Email address.
    pub email: String,
    /// Reset code.
    pub code: String,
    /// New password.
    pub password: String,
}
