//! Message Store Gateway - Ordered reads and append-only writes

use super::conversation::{Conversation, ConversationMode};
use super::error::{MessagingError, MessagingResult};
use super::read_tracking;
use crate::core::AppState;
use crate::dtos::CreateMessageDTO;
use crate::entities::Message;
use crate::repositories::Create;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Messages of `conversation` as seen by `me`, oldest first.
///
/// The store filter is coarse for direct messages (either address may sit in
/// either slot), so every row is re-checked with the exact predicate.
#[instrument(skip(state), fields(mode = ?conversation.mode()))]
pub async fn fetch(
    state: &AppState,
    conversation: &Conversation,
    me: &str,
) -> MessagingResult<Vec<Message>> {
    let Some(filter) = conversation.build_filter(me) else {
        debug!("No selection, nothing to fetch");
        return Ok(Vec::new());
    };

    let rows = state.msg.find_many_by_filter(&filter).await?;
    let total = rows.len();
    let messages: Vec<Message> = rows
        .into_iter()
        .filter(|m| conversation.matches(me, m))
        .collect();

    if messages.len() != total {
        debug!(
            dropped = total - messages.len(),
            "Refinement dropped rows outside the conversation"
        );
    }
    Ok(messages)
}

/// Fetch followed by best-effort read tracking. A failed receipt write is
/// logged and the messages are still returned.
#[instrument(skip(state), fields(mode = ?conversation.mode()))]
pub async fn load(
    state: &AppState,
    conversation: &Conversation,
    viewer: &str,
) -> MessagingResult<Vec<Message>> {
    let messages = fetch(state, conversation, viewer).await?;

    if !messages.is_empty() {
        if let Err(e) = read_tracking::mark_read(state, &messages, viewer).await {
            warn!("Failed to record read receipts: {}", e);
        }
    }

    Ok(messages)
}

/// Posts `text` into `conversation` on behalf of `me`.
///
/// The role is resolved now and stored with the row. Nothing is written
/// when the text is blank or the conversation has no target selected.
#[instrument(skip(state, text), fields(mode = ?conversation.mode()))]
pub async fn send(
    state: &AppState,
    me: &str,
    conversation: &Conversation,
    text: &str,
) -> MessagingResult<Message> {
    if text.trim().is_empty() {
        return Err(MessagingError::validation("Message text cannot be empty"));
    }

    let recipient = conversation.recipient(me).ok_or_else(|| {
        MessagingError::validation(match conversation.mode() {
            ConversationMode::Direct => "Select a user before sending a direct message",
            _ => "Select or create a private group before sending",
        })
    })?;

    if let Conversation::Group { key: Some(key) } = conversation {
        key.check_sender(me).inspect_err(|e| {
            warn!(group = %key, "Group send rejected: {}", e);
        })?;
    }

    let draft = CreateMessageDTO {
        text: text.to_string(),
        sender: me.to_string(),
        role: state.roles.resolve_role(me).to_string(),
        kind: conversation.kind(),
        recipient,
    };
    draft
        .validate()
        .map_err(|e| MessagingError::validation(e.to_string()))?;

    let message = state.msg.create(&draft).await?;
    info!(message_id = message.id, kind = %message.kind, "Message stored");
    Ok(message)
}
