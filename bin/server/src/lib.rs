//! HTTP front end for the cookbook assistant.
//!
//! Exposes sessions and turns over a small JSON API. Each session owns the
//! tool catalog discovered when it opened and admits one turn at a time.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ServerConfig, SessionConfig};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
