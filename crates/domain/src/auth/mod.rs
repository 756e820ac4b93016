//! Authentication domain types

mod tokens;
mod types;

pub use tokens::{AuthTokens, TokenPatch, token_preview};
pub use types::{
    Credentials, EmailAddress, EmailVerification, PasswordResetConfirmation, RefreshRequest,
    RefreshResponse, Registration, TokenPair, UserProfile,
};
