//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. It performs exactly
//! one exchange per call and returns every response it receives,
//! whatever the status.

use std::collections::HashMap;
use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use datacake_application::ports::{HttpTransport, TransportError, TransportRequest};
use datacake_domain::{ApiResponse, HttpMethod};
use reqwest::{Client, Method};
use tracing::trace;

/// Timeout applied when a request does not set its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport whose requests time out after `timeout`.
    ///
    /// Redirects are followed up to 10 hops.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("datacake/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub const fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Maps reqwest errors to `TransportError`.
    ///
    /// Connection errors are classified from the whole source chain,
    /// since reqwest's own message only names the URL.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        let host = error
            .url()
            .and_then(|u| u.host_str())
            .unwrap_or("unknown")
            .to_string();

        if error.is_connect() {
            let message = error_chain(error);
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return TransportError::DnsError { host, message };
            }
            if lowered.contains("refused") {
                return TransportError::ConnectionRefused {
                    host,
                    port: error
                        .url()
                        .and_then(reqwest::Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        if error.is_body() || error.is_decode() {
            return TransportError::Body(error_chain(error));
        }

        TransportError::Other(error_chain(error))
    }
}

fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<ApiResponse, TransportError> {
        let timeout = request.timeout.unwrap_or(self.timeout);
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), request.url.clone())
            .timeout(timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| TransportError::Body(e.to_string()))?;
            builder = builder.body(bytes);
        }

        trace!(method = %request.method, url = %request.url, "sending");
        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let status = response.status().as_u16();

        // Header names come lowercased from the http crate.
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?
            .to_vec();

        Ok(ApiResponse::new(status, headers, body))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(method: HttpMethod, url: &str) -> TransportRequest {
        TransportRequest::new(method, Url::parse(url).unwrap())
    }

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestTransport::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestTransport::to_reqwest_method(HttpMethod::Patch),
            Method::PATCH
        );
        assert_eq!(
            ReqwestTransport::to_reqwest_method(HttpMethod::Delete),
            Method::DELETE
        );
    }

    #[tokio::test]
    async fn test_sends_headers_query_and_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tasks/"))
            .and(query_param("status", "pendente"))
            .and(header("authorization", "Bearer acc"))
            .and(body_json(json!({"title": "x"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let mut outgoing = request(
            HttpMethod::Post,
            &format!("{}/api/tasks/?status=pendente", server.uri()),
        );
        outgoing
            .headers
            .push(("Authorization".to_string(), "Bearer acc".to_string()));
        outgoing
            .headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        outgoing.body = Some(json!({"title": "x"}));

        let response = transport.execute(outgoing).await.unwrap();

        assert_eq!(response.status.as_u16(), 201);
        assert_eq!(
            response.json::<serde_json::Value>().unwrap(),
            json!({"id": 1})
        );
        assert_eq!(response.header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_error_statuses_are_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .execute(request(HttpMethod::Get, &server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status.as_u16(), 401);
        assert_eq!(response.text(), "expired");
    }

    #[tokio::test]
    async fn test_request_timeout_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let mut outgoing = request(HttpMethod::Get, &server.uri());
        outgoing.timeout = Some(Duration::from_millis(50));

        let error = transport.execute(outgoing).await.unwrap_err();

        assert_eq!(error, TransportError::Timeout { timeout_ms: 50 });
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_connection_error() {
        let transport = ReqwestTransport::with_timeout(Duration::from_secs(2)).unwrap();

        let error = transport
            .execute(request(HttpMethod::Get, "http://127.0.0.1:1/api/health/"))
            .await
            .unwrap_err();

        assert!(
            matches!(
                error,
                TransportError::ConnectionRefused { .. } | TransportError::ConnectionFailed(_)
            ),
            "unexpected error: {error:?}"
        );
    }
}
