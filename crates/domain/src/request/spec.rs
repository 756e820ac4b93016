//! Logical API request.
//!
//! Callers describe a request relative to the API root; the pipeline
//! resolves it against whatever base URL is current at dispatch time.

use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::HttpMethod;
use crate::base_url::strip_trailing_slash;
use crate::error::{DomainError, DomainResult};

/// A request relative to the API root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path below the API root, e.g. `tasks/12/`.
    pub path: String,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Query parameters in insertion order.
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    /// Creates a request without body or query.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a PATCH request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets a JSON body from a raw value.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `payload` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBody` if the payload cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(self, payload: &T) -> DomainResult<Self> {
        let value =
            serde_json::to_value(payload).map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        Ok(self.with_body(value))
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// The path with its leading separator and any inline query removed.
    #[must_use]
    pub fn relative_path(&self) -> &str {
        let path = self.path.trim_start_matches('/');
        path.split(['?', '#']).next().unwrap_or(path)
    }

    /// The path in `/segment/` form used for endpoint matching.
    #[must_use]
    pub fn normalized_path(&self) -> String {
        format!("/{}", self.relative_path())
    }

    /// Builds the absolute URL below `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` if the joined URL does not parse.
    pub fn url_for(&self, base_url: &str) -> DomainResult<Url> {
        let raw = format!(
            "{}/{}",
            strip_trailing_slash(base_url),
            self.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|e| DomainError::InvalidUrl(format!("{e}: {raw}")))?;

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}
