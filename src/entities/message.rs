//! Message entity - One chat utterance

use super::enums::MessageKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub sender: String,
    // snapshot of the sender's role label at send time, never recomputed
    pub role: String,
    pub kind: MessageKind,
    // "group" for broadcast, peer email for dm, group key for multi_group
    pub recipient: String,
    // assigned by the store, the only ordering key (ties broken by id)
    pub created_at: DateTime<Utc>,
}
