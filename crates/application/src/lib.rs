//! Datacake Application - Client core services
//!
//! This crate contains the HTTP access layer of the Datacake client:
//! - Ports (traits) for storage, transport and environment hints
//! - Token persistence and the authenticated session
//! - Base-URL resolution with reachability probing
//! - The request pipeline with single-flight token refresh
//! - Account and task use cases

pub mod auth;
pub mod client;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod resolver;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{AuthSession, Subscription, TokenStore};
pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use pipeline::RequestPipeline;
pub use resolver::{BaseUrlResolution, BaseUrlResolver, ProbeStatus, ResolverConfig};
pub use use_cases::{AuthApi, TasksApi};
