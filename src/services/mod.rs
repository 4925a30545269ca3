//! Services module - HTTP handlers
//!
//! Each sub-module exposes the endpoints of one feature; the messaging logic
//! itself lives in [`crate::messaging`].

pub mod groups;
pub mod messages;
pub mod user;

// Re-exports
pub use groups::{create_group, list_groups};
pub use messages::{get_messages, send_message};
pub use user::{get_me, get_unread, list_contacts};

use axum::{http::StatusCode, response::IntoResponse};

/// Root endpoint - health check
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
