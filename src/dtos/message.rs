//! Message DTOs - Data Transfer Objects for messages

use super::conversation::ConversationQuery;
use super::unread::UnreadBadgesDTO;
use crate::entities::{Message, MessageKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Label shown when a stored row carries no role.
pub const UNKNOWN_ROLE: &str = "Unknown";

/// Struct for client I/O
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageDTO {
    pub id: i64,
    pub text: String,
    pub sender: String,
    pub role: String,
    pub kind: MessageKind,
    pub recipient: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDTO {
    fn from(value: Message) -> Self {
        let role = if value.role.trim().is_empty() {
            UNKNOWN_ROLE.to_string()
        } else {
            value.role
        };
        Self {
            id: value.id,
            text: value.text,
            sender: value.sender,
            role,
            kind: value.kind,
            recipient: value.recipient,
            created_at: value.created_at,
        }
    }
}

/// DTO to create a new message (no id, no created_at: both assigned by the store)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateMessageDTO {
    #[validate(length(min = 1, max = 5000, message = "Message text must be between 1 and 5000 characters"))]
    pub text: String,

    #[validate(length(min = 1, message = "Sender cannot be empty"))]
    pub sender: String,

    pub role: String,
    pub kind: MessageKind,

    #[validate(length(min = 1, message = "Recipient cannot be empty"))]
    pub recipient: String,
}

/// Body of `POST /messages`: the target conversation plus the text
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SendMessageDTO {
    #[serde(flatten)]
    pub conversation: ConversationQuery,

    #[validate(length(min = 1, max = 5000, message = "Message text must be between 1 and 5000 characters"))]
    pub text: String,
}

/// Response of `POST /messages`: the stored message and the re-fetched
/// conversation it now appears in
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SentMessageDTO {
    pub message: MessageDTO,
    // empty when the re-fetch failed; the next load or feed event fills it in
    pub messages: Vec<MessageDTO>,
    pub badges: Option<UnreadBadgesDTO>,
}
