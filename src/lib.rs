//! rescue-chat - Messaging service of the volunteer coordination platform
//!
//! Organization-wide chat, direct messages and ad-hoc private groups, with
//! read tracking and realtime delivery over WebSocket.

pub mod core;
pub mod dtos;
pub mod entities;
pub mod messaging;
pub mod repositories;
pub mod services;
pub mod ws;

// Re-exports of the main types, handy for tests
pub use core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router, middleware,
    routing::{any, get},
};
use std::sync::Arc;

/// Builds the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(configure_user_routes(state.clone()))
        .merge(configure_message_routes(state.clone()))
        .merge(configure_group_routes(state.clone()))
        .merge(configure_realtime_routes(state.clone()))
        .with_state(state)
}

/// Current principal, contacts and unread badges
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/me", get(get_me))
        .route("/contacts", get(list_contacts))
        .route("/unread", get(get_unread))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Conversation reads and sends
fn configure_message_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/messages", get(get_messages).post(send_message))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Ad-hoc private groups
fn configure_group_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// WebSocket sessions
fn configure_realtime_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use ws::ws_handler;

    Router::new().route(
        "/ws",
        any(ws_handler).layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        )),
    )
}
