//! Shared bearer-token authentication for the API.

pub mod middleware;

pub use middleware::{bearer_token, RequireToken};
