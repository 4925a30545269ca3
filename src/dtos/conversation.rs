//! Conversation DTOs - Selection of the active conversation

use crate::messaging::{Conversation, ConversationMode, GroupKey};
use serde::{Deserialize, Serialize};

/// Query parameters (or JSON fields) selecting a conversation.
/// Fields that do not belong to the chosen mode are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConversationQuery {
    pub mode: ConversationMode,
    #[serde(default)]
    pub peer: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl ConversationQuery {
    pub fn into_conversation(self) -> Conversation {
        match self.mode {
            ConversationMode::Broadcast => Conversation::Broadcast,
            ConversationMode::Direct => Conversation::Direct {
                peer: self
                    .peer
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty()),
            },
            ConversationMode::Group => Conversation::Group {
                key: self.group.as_deref().and_then(GroupKey::parse),
            },
        }
    }
}

impl From<&Conversation> for ConversationQuery {
    fn from(value: &Conversation) -> Self {
        match value {
            Conversation::Broadcast => Self {
                mode: ConversationMode::Broadcast,
                peer: None,
                group: None,
            },
            Conversation::Direct { peer } => Self {
                mode: ConversationMode::Direct,
                peer: peer.clone(),
                group: None,
            },
            Conversation::Group { key } => Self {
                mode: ConversationMode::Group,
                peer: None,
                group: key.as_ref().map(|k| k.as_str().to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irrelevant_selection_is_dropped() {
        let query = ConversationQuery {
            mode: ConversationMode::Group,
            peer: Some("b@x.org".to_string()),
            group: None,
        };
        assert_eq!(query.into_conversation(), Conversation::Group { key: None });
    }

    #[test]
    fn test_blank_peer_means_no_selection() {
        let query = ConversationQuery {
            mode: ConversationMode::Direct,
            peer: Some("  ".to_string()),
            group: None,
        };
        assert_eq!(query.into_conversation(), Conversation::Direct { peer: None });
    }

    #[test]
    fn test_round_trip_through_query() {
        let conversation = Conversation::direct("b@x.org");
        let query = ConversationQuery::from(&conversation);
        assert_eq!(query.into_conversation(), conversation);
    }
}
