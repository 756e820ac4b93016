//! Session credentials for the Datacake client.
//!
//! This module provides:
//! - Durable token storage that degrades to memory
//! - The authenticated session owning the current tokens
//! - The unauthorized listener registry

mod listeners;
mod session;
mod token_store;

pub use listeners::{Subscription, UnauthorizedListeners};
pub use session::AuthSession;
pub use token_store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore};
