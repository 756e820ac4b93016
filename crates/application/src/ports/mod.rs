//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the client core and the host
//! platform. Each port is a trait implemented by adapters in the
//! infrastructure layer.

mod environment_hints;
mod http_transport;
mod key_value_store;

pub use environment_hints::EnvironmentHints;
pub use http_transport::{HttpTransport, TransportError, TransportRequest};
pub use key_value_store::{KeyValueStore, StorageError};
