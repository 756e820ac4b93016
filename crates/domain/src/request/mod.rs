//! Logical request types issued by callers of the client core

mod method;
mod spec;

pub use method::HttpMethod;
pub use spec::ApiRequest;
