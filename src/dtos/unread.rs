//! Unread DTOs - Badge counters derived from read receipts

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UnreadBadgesDTO {
    pub org_unread_count: u64,
    pub dm_unread_peers: Vec<String>,
}
