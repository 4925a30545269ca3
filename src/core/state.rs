//! Application State - Shared state of the application
//!
//! Holds every repository, the role catalog, the change feed and the
//! registry of live sessions.

use crate::messaging::RoleCatalog;
use crate::repositories::{MessageRepository, ReadReceiptRepository, UserRepository};
use crate::ws::{ChangeFeed, SessionMap};
use sqlx::SqlitePool;

/// Global state shared by every route, middleware and session
pub struct AppState {
    /// Repository for chat messages (publishes inserts on `feed`)
    pub msg: MessageRepository,

    /// Repository for read receipts and unread aggregates
    pub reads: ReadReceiptRepository,

    /// Repository for the contact directory
    pub user: UserRepository,

    /// Email -> role label lookup used when stamping outgoing messages
    pub roles: RoleCatalog,

    /// Secret used to verify the identity provider's tokens
    pub jwt_secret: String,

    /// Live stream of message table changes
    pub feed: ChangeFeed,

    /// Sessions currently connected, one per principal
    pub sessions: SessionMap,
}

impl AppState {
    /// Builds the state around an already migrated pool.
    ///
    /// # Arguments
    /// * `pool` - Shared SQLite connection pool
    /// * `jwt_secret` - Key used to verify bearer tokens
    /// * `roles` - Role catalog for the deployment
    pub fn new(pool: SqlitePool, jwt_secret: String, roles: RoleCatalog) -> Self {
        let feed = ChangeFeed::new();
        Self {
            msg: MessageRepository::new(pool.clone(), feed.clone()),
            reads: ReadReceiptRepository::new(pool.clone()),
            user: UserRepository::new(pool),
            roles,
            jwt_secret,
            feed,
            sessions: SessionMap::new(),
        }
    }
}
