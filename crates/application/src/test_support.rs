//! Fakes shared by the unit tests of this crate.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use datacake_domain::ApiResponse;
use parking_lot::Mutex;

use crate::ports::{HttpTransport, KeyValueStore, StorageError, TransportError, TransportRequest};

/// Key/value store kept in a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        let store = Self::default();
        for (key, value) in entries {
            store
                .values
                .lock()
                .insert((*key).to_string(), (*value).to_string());
        }
        store
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Store whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }
}

type Handler = Box<dyn Fn(&TransportRequest) -> Result<ApiResponse, TransportError> + Send + Sync>;

#[derive(Debug, Clone)]
enum Reply {
    Respond(ApiResponse),
    Hang(Duration),
}

/// Transport that answers from a script and records every request.
///
/// A handler, when set, answers everything. Otherwise replies are looked
/// up by host, and unknown hosts refuse the connection.
#[derive(Default)]
pub struct ScriptedTransport {
    handler: Mutex<Option<Handler>>,
    by_host: Mutex<HashMap<String, Reply>>,
    latency: Mutex<Duration>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&TransportRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        let transport = Self::default();
        *transport.handler.lock() = Some(Box::new(handler));
        transport
    }

    pub fn respond_to(&self, host: &str, response: ApiResponse) {
        self.by_host
            .lock()
            .insert(host.to_string(), Reply::Respond(response));
    }

    pub fn hang_for(&self, host: &str, duration: Duration) {
        self.by_host
            .lock()
            .insert(host.to_string(), Reply::Hang(duration));
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.url.to_string())
            .collect()
    }

    /// Number of requests whose path ends with `suffix`.
    pub fn count_path(&self, suffix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url.path().ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: TransportRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().push(request.clone());

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(handler) = self.handler.lock().as_ref() {
            return handler(&request);
        }

        let host = request.url.host_str().unwrap_or_default().to_string();
        let reply = self.by_host.lock().get(&host).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Hang(duration)) => {
                tokio::time::sleep(duration).await;
                Err(TransportError::Timeout {
                    timeout_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                })
            }
            None => Err(TransportError::ConnectionRefused {
                host,
                port: request.url.port_or_known_default().unwrap_or(80),
            }),
        }
    }
}
