//! Errors raised before a request leaves the client.

use thiserror::Error;

/// Validation failures in domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Not an absolute `http(s)` URL, or a path that cannot be joined onto one.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Not one of the methods the API speaks.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Payload that does not serialize to JSON.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A task draft the backend would reject.
    #[error("invalid task: {0}")]
    InvalidTask(String),

    /// Platform name outside android, ios, web and desktop.
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
}

/// Shorthand for domain results.
pub type DomainResult<T> = Result<T, DomainError>;
