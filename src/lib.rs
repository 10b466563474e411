//! ByteBros Backend Library
//!
//! Catalog, news and support backend with stateless JWT authentication.
//! The binary in main.rs only wires configuration, logging and the listener;
//! everything reachable over HTTP lives here so integration tests can drive it.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod middleware;
pub mod store;
pub mod validation;

pub use api::routes::{build_router, AppState};
pub use error::ApiError;
