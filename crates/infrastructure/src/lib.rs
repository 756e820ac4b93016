//! Datacake Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, the environment-driven
//! configuration and the wiring that assembles a client from them.

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod hints;
pub mod persistence;

pub use adapters::ReqwestTransport;
pub use bootstrap::build_client;
pub use config::{ClientConfig, ConfigError};
pub use hints::EnvHints;
pub use persistence::FileKeyValueStore;
