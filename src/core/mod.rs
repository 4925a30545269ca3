//! Core Module - Infrastructure components of the application
//!
//! - Token verification (session accessor)
//! - Configuration
//! - Error handling
//! - Logging
//! - Application state

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;

// Re-exports
pub use auth::{Claims, authentication_middleware, decode_jwt, encode_jwt};
pub use config::Config;
pub use error::AppError;
pub use logging::init_tracing;
pub use state::AppState;
