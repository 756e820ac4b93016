//! Application use cases built on the request function.

mod auth;
mod tasks;

pub use auth::AuthApi;
pub use tasks::TasksApi;
