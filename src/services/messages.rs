//! Message services - Conversation reads and sends

use crate::core::{AppError, AppState};
use crate::dtos::{ConversationQuery, MessageDTO, SendMessageDTO, SentMessageDTO};
use crate::entities::Principal;
use crate::messaging::{gateway, read_tracking};
use axum::{
    Extension,
    extract::{Json, Query, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, principal), fields(email = %principal.email, mode = ?params.mode))]
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ConversationQuery>,
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    debug!("Fetching conversation messages");
    // 1. Turn the query parameters into a conversation (missing selection -> empty list)
    // 2. Fetch the ordered messages and refine direct messages to the exact pair
    // 3. Record read receipts for the caller, best-effort
    let conversation = params.into_conversation();
    let messages = gateway::load(&state, &conversation, &principal.email).await?;

    info!("Retrieved {} messages", messages.len());
    Ok(Json(messages.into_iter().map(MessageDTO::from).collect()))
}

#[instrument(skip(state, principal, body), fields(email = %principal.email, mode = ?body.conversation.mode))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<SendMessageDTO>,
) -> Result<Json<SentMessageDTO>, AppError> {
    debug!("Sending message");
    body.validate()?;

    let conversation = body.conversation.into_conversation();
    let message = gateway::send(&state, &principal.email, &conversation, &body.text).await?;

    // re-fetch so the author sees the message without waiting on the feed;
    // the row is already stored, so a failure here must not look like a failed send
    let messages = match gateway::load(&state, &conversation, &principal.email).await {
        Ok(messages) => messages,
        Err(e) => {
            warn!("Failed to re-fetch conversation after send: {}", e);
            Vec::new()
        }
    };

    let badges = match read_tracking::badges(&state, &principal.email).await {
        Ok(badges) => Some(badges),
        Err(e) => {
            warn!("Failed to recompute unread badges: {}", e);
            None
        }
    };

    info!(message_id = message.id, "Message sent");
    Ok(Json(SentMessageDTO {
        message: MessageDTO::from(message),
        messages: messages.into_iter().map(MessageDTO::from).collect(),
        badges,
    }))
}
