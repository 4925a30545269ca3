//! Group services - Ad-hoc private groups

use crate::core::{AppError, AppState};
use crate::dtos::{CreateGroupDTO, GroupDTO};
use crate::entities::Principal;
use crate::messaging::groups;
use axum::{
    Extension,
    extract::{Json, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

#[instrument(skip(state, principal), fields(email = %principal.email))]
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<GroupDTO>>, AppError> {
    debug!("Listing private groups");
    let keys = groups::list_groups(&state, &principal.email).await?;

    info!("User is member of {} groups", keys.len());
    Ok(Json(keys.into_iter().map(GroupDTO::from).collect()))
}

#[instrument(skip(state, principal, body), fields(email = %principal.email))]
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<CreateGroupDTO>,
) -> Result<Json<GroupDTO>, AppError> {
    debug!("Creating private group");
    body.validate()?;

    let key = groups::create_group(&state, &principal.email, &body.members).await?;
    Ok(Json(GroupDTO::from(key)))
}
