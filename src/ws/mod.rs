//! WebSocket Module - Realtime delivery
//!
//! - [`feed`]: the unfiltered change feed every insert is published on
//! - [`sessions`]: registry of live sessions, one per principal
//! - [`session`]: the conversation session (notifier state machine)
//! - [`connection`]: socket plumbing between a client and its session

pub mod connection;
pub mod feed;
pub mod session;
pub mod sessions;

// Public re-exports
pub use connection::handle_socket;
pub use feed::{ChangeEvent, ChangeFeed};
pub use session::{ChangeOutcome, ConversationSession, SessionState, run_session};
pub use sessions::{InternalSignal, SessionMap};

use crate::{AppState, entities::Principal};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

/// Capacity of the change feed; slower sessions lag and resynchronize
pub const FEED_CHANNEL_CAPACITY: usize = 256;

/// A socket silent for this long is considered dead
pub const CLIENT_TIMEOUT_SECONDS: u64 = 30 * 60;

/// Entry point for WebSocket upgrade requests
/// The principal comes from the authentication middleware
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, principal.email))
}
