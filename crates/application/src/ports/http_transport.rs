//! HTTP transport port
//!
//! The plain request function the pipeline decorates. A transport
//! performs exactly one network exchange and knows nothing about
//! sessions or retries.

use std::time::Duration;

use async_trait::async_trait;
use datacake_domain::{ApiResponse, HttpMethod};
use serde_json::Value;
use url::Url;

/// Errors for requests that produced no HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The host refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The host name could not be resolved.
    #[error("DNS lookup failed for {host}: {message}")]
    DnsError {
        /// Target host.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// Any other connection failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The URL could not be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The body could not be sent or read.
    #[error("body error: {0}")]
    Body(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// A fully resolved request ready to go on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL, query included.
    pub url: Url,
    /// Headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Value>,
    /// Per-request timeout overriding the transport default.
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    /// Creates a request without headers, body or timeout.
    #[must_use]
    pub const fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Returns a header value, matching the name case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes single HTTP exchanges.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns whatever response arrives,
    /// including non-2xx statuses.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` when no response is received.
    async fn execute(&self, request: TransportRequest) -> Result<ApiResponse, TransportError>;
}
