//! Datacake Domain - Core client types
//!
//! This crate defines the domain model for the Datacake client core:
//! credentials, base-URL metadata, host inference rules and the
//! request/response values exchanged with the backend.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod base_url;
pub mod endpoints;
pub mod error;
pub mod host;
pub mod request;
pub mod response;
pub mod task;

pub use auth::{
    AuthTokens, Credentials, EmailAddress, EmailVerification, PasswordResetConfirmation,
    RefreshRequest, RefreshResponse, Registration, TokenPair, TokenPatch, UserProfile,
    token_preview,
};
pub use base_url::{BaseUrlMeta, BaseUrlSource};
pub use error::{DomainError, DomainResult};
pub use host::{RuntimePlatform, RuntimeTarget};
pub use request::{ApiRequest, HttpMethod};
pub use response::{ApiResponse, StatusCode};
pub use task::{ChecklistItem, Task, TaskDraft, TaskFilter};
