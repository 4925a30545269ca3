//! Conversation Router - Maps the active conversation to a store filter
//!
//! The same module owns the exact membership predicate ([`Conversation::matches`]),
//! shared by the fetch refinement and by the realtime refresh decision so the
//! two can never disagree.

use super::groups::GroupKey;
use crate::entities::{Message, MessageKind};
use serde::{Deserialize, Serialize};

/// Fixed recipient of every organization-wide message.
pub const BROADCAST_RECIPIENT: &str = "group";

/// Conversation mode as chosen by the user.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    #[serde(alias = "organization")]
    Broadcast,
    #[serde(alias = "dm")]
    Direct,
    #[serde(alias = "multi_group")]
    Group,
}

/// Active conversation. The selection lives inside the variant it belongs
/// to, so a peer can never be set while a group is open (and vice versa).
/// An absent selection is a legal "pick something" state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversation {
    Broadcast,
    Direct { peer: Option<String> },
    Group { key: Option<GroupKey> },
}

/// Coarse store-level filter: equality on `kind`, membership on
/// `recipient` and optionally on `sender`, ascending `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub kind: MessageKind,
    /// Empty means "any sender".
    pub sender_in: Vec<String>,
    /// Never empty.
    pub recipient_in: Vec<String>,
}

impl Conversation {
    pub fn direct(peer: impl Into<String>) -> Self {
        Conversation::Direct {
            peer: Some(peer.into()),
        }
    }

    pub fn group(key: GroupKey) -> Self {
        Conversation::Group { key: Some(key) }
    }

    pub fn mode(&self) -> ConversationMode {
        match self {
            Conversation::Broadcast => ConversationMode::Broadcast,
            Conversation::Direct { .. } => ConversationMode::Direct,
            Conversation::Group { .. } => ConversationMode::Group,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Conversation::Broadcast => MessageKind::Group,
            Conversation::Direct { .. } => MessageKind::Dm,
            Conversation::Group { .. } => MessageKind::MultiGroup,
        }
    }

    /// Recipient a message posted into this conversation carries, if a
    /// target is selected. A dm addressed to oneself is not a target.
    pub fn recipient(&self, me: &str) -> Option<String> {
        match self {
            Conversation::Broadcast => Some(BROADCAST_RECIPIENT.to_string()),
            Conversation::Direct { peer: Some(peer) } if peer != me => Some(peer.clone()),
            Conversation::Direct { .. } => None,
            Conversation::Group { key } => key.as_ref().map(|k| k.as_str().to_string()),
        }
    }

    /// Builds the store filter for `me`. `None` means "no selection": the
    /// caller shows an empty prompt instead of querying.
    pub fn build_filter(&self, me: &str) -> Option<QueryFilter> {
        match self {
            Conversation::Broadcast => Some(QueryFilter {
                kind: MessageKind::Group,
                sender_in: Vec::new(),
                recipient_in: vec![BROADCAST_RECIPIENT.to_string()],
            }),
            Conversation::Direct { peer } => {
                let peer = peer.as_deref().filter(|p| *p != me)?;
                let pair = vec![me.to_string(), peer.to_string()];
                Some(QueryFilter {
                    kind: MessageKind::Dm,
                    sender_in: pair.clone(),
                    recipient_in: pair,
                })
            }
            Conversation::Group { key } => key.as_ref().map(|key| QueryFilter {
                kind: MessageKind::MultiGroup,
                sender_in: Vec::new(),
                recipient_in: vec![key.as_str().to_string()],
            }),
        }
    }

    /// Exact predicate: does `message` belong to this conversation as seen by `me`?
    pub fn matches(&self, me: &str, message: &Message) -> bool {
        if message.kind != self.kind() {
            return false;
        }
        match self {
            Conversation::Broadcast => message.recipient == BROADCAST_RECIPIENT,
            Conversation::Direct { peer } => match peer.as_deref() {
                Some(peer) if peer != me => {
                    (message.sender == me && message.recipient == peer)
                        || (message.sender == peer && message.recipient == me)
                }
                _ => false,
            },
            Conversation::Group { key } => key
                .as_ref()
                .is_some_and(|key| message.recipient == key.as_str()),
        }
    }

    pub fn has_selection(&self, me: &str) -> bool {
        self.build_filter(me).is_some()
    }

    /// Heading shown above the conversation.
    pub fn title(&self) -> String {
        match self {
            Conversation::Broadcast => "Organization Chat".to_string(),
            Conversation::Direct { peer: Some(peer) } => format!("Chat with {}", peer),
            Conversation::Direct { peer: None } => "Direct Messages".to_string(),
            Conversation::Group { .. } => "Private Group Chat".to_string(),
        }
    }

    /// Placeholder text for a conversation without messages to show.
    pub fn empty_prompt(&self, me: &str) -> &'static str {
        match self {
            Conversation::Broadcast => "No messages yet in Organization Chat.",
            Conversation::Direct { .. } if !self.has_selection(me) => {
                "Please select a user to view direct messages."
            }
            Conversation::Group { key: None } => "Select or create a private group chat.",
            _ => "No messages yet.",
        }
    }
}
