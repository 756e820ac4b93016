//! Response types returned by the transport

mod spec;

pub use spec::{ApiResponse, StatusCode};
