//! Enums - Enumerated types used by the entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversation family a message belongs to. Stored as lowercase text.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Organization-wide broadcast, recipient is always `"group"`
    Group,
    /// Two-party direct message, recipient is the peer email
    Dm,
    /// Ad-hoc private group, recipient is the group key
    MultiGroup,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Group => "group",
            MessageKind::Dm => "dm",
            MessageKind::MultiGroup => "multi_group",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation reported by the change feed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}
