//! WebSocket Event DTOs - Commands from the client and events of the session
//!
//! Both enums are adjacently tagged, serde renders them as
//! `{ "type": "Open", "data": { ... } }`.

use super::conversation::ConversationQuery;
use super::group::GroupDTO;
use super::message::MessageDTO;
use super::unread::UnreadBadgesDTO;
use crate::entities::{Message, MessageKind};
use serde::{Deserialize, Serialize};

/// Commands a client sends over the socket
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "data")]
pub enum SessionCommand {
    /// Switch the active conversation (re-subscribes the session)
    Open(ConversationQuery),
    Send { text: String },
    CreateGroup { members: Vec<String> },
    /// Manual refresh of messages, badges and groups
    Refresh,
    /// Dismiss the current notification
    Dismiss,
    Close,
}

/// Toast-style notice for a message written by someone else
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NotificationDTO {
    pub message_id: i64,
    pub kind: MessageKind,
    pub sender: String,
    pub text: String,
}

impl From<&Message> for NotificationDTO {
    fn from(value: &Message) -> Self {
        Self {
            message_id: value.id,
            kind: value.kind,
            sender: value.sender.clone(),
            text: format!("New Message from: {} ({})", value.sender, value.kind),
        }
    }
}

/// Events pushed by a session to its client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// Full, ordered content of the active conversation
    Messages {
        conversation: ConversationQuery,
        title: String,
        prompt: Option<String>,
        messages: Vec<MessageDTO>,
    },
    Badges(UnreadBadgesDTO),
    Groups(Vec<GroupDTO>),
    GroupCreated(GroupDTO),
    Notification(NotificationDTO),
    NotificationDismissed,
    Error { code: u16, message: String },
}
