//! Read-Tracking Engine - Receipts and the unread aggregates derived from them
//!
//! Aggregates are read-through queries over messages and receipts; nothing
//! is cached between calls. Recompute after a send, after `mark_read`, and
//! after every realtime insert.

use super::error::MessagingResult;
use crate::core::AppState;
use crate::dtos::UnreadBadgesDTO;
use crate::entities::Message;
use tracing::{debug, instrument};

/// Records that `viewer` has seen every message in `messages`.
/// Re-marking is a no-op. Returns the number of new receipts.
#[instrument(skip(state, messages), fields(count = messages.len()))]
pub async fn mark_read(state: &AppState, messages: &[Message], viewer: &str) -> MessagingResult<u64> {
    let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
    let inserted = state.reads.mark_many(&ids, viewer).await?;
    debug!(inserted, "Read receipts recorded");
    Ok(inserted)
}

/// Organization-wide messages `user` has not read (own messages excluded).
pub async fn unread_org_count(state: &AppState, user: &str) -> MessagingResult<u64> {
    let count = state.reads.count_unread_group_messages(user).await?;
    Ok(count)
}

/// Peers with at least one unread direct message for `user`, sorted.
pub async fn unread_dm_peers(state: &AppState, user: &str) -> MessagingResult<Vec<String>> {
    let peers = state.reads.list_unread_dm_peers(user).await?;
    Ok(peers.into_iter().filter(|p| !p.is_empty()).collect())
}

#[instrument(skip(state))]
pub async fn badges(state: &AppState, user: &str) -> MessagingResult<UnreadBadgesDTO> {
    let org_unread_count = unread_org_count(state, user).await?;
    let dm_unread_peers = unread_dm_peers(state, user).await?;
    Ok(UnreadBadgesDTO {
        org_unread_count,
        dm_unread_peers,
    })
}
