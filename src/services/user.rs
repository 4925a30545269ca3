//! User services - Current principal, contacts and unread badges

use crate::core::{AppError, AppState};
use crate::dtos::{PrincipalDTO, UnreadBadgesDTO};
use crate::entities::Principal;
use crate::messaging::{directory, read_tracking};
use axum::{
    Extension,
    extract::{Json, State},
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[instrument(skip(state, principal), fields(email = %principal.email))]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<PrincipalDTO>, AppError> {
    if let Err(e) = directory::register(&state, &principal.email).await {
        warn!("Failed to register address in directory: {}", e);
    }

    let role = state.roles.resolve_role(&principal.email).to_string();
    Ok(Json(PrincipalDTO {
        email: principal.email,
        role,
    }))
}

#[instrument(skip(state, principal), fields(email = %principal.email))]
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<String>>, AppError> {
    debug!("Listing contacts");
    let contacts = directory::list_contacts(&state, &principal.email).await?;
    Ok(Json(contacts))
}

#[instrument(skip(state, principal), fields(email = %principal.email))]
pub async fn get_unread(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UnreadBadgesDTO>, AppError> {
    debug!("Computing unread badges");
    let badges = read_tracking::badges(&state, &principal.email).await?;
    Ok(Json(badges))
}
