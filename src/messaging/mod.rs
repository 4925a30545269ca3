//! Messaging module - Chat routing, storage gateway, read tracking and groups
//!
//! Operations take the shared [`AppState`](crate::core::AppState) and the
//! caller's email; they are used both by the HTTP handlers and by the
//! realtime session.

pub mod conversation;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod groups;
pub mod identity;
pub mod read_tracking;

pub use conversation::{BROADCAST_RECIPIENT, Conversation, ConversationMode, QueryFilter};
pub use error::{MessagingError, MessagingResult};
pub use groups::{GROUP_CREATED_TEXT, GROUP_DELIMITER, GroupKey};
pub use identity::{DEFAULT_ROLE, RoleCatalog};
