//! DTOs module - Data Transfer Objects
//!
//! DTOs keep the external representation (HTTP and WebSocket) separate from
//! the internal one (entities).

pub mod conversation;
pub mod group;
pub mod message;
pub mod unread;
pub mod user;
pub mod ws_event;

// Re-exports
pub use conversation::ConversationQuery;
pub use group::{CreateGroupDTO, GroupDTO};
pub use message::{CreateMessageDTO, MessageDTO, SendMessageDTO, SentMessageDTO, UNKNOWN_ROLE};
pub use unread::UnreadBadgesDTO;
pub use user::PrincipalDTO;
pub use ws_event::{NotificationDTO, SessionCommand, SessionEvent};
