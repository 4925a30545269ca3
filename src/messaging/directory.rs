//! Contact Directory - Addresses a user can message or add to a group

use super::error::MessagingResult;
use crate::core::AppState;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Registered users plus the catalog's known addresses, without `me`.
#[instrument(skip(state))]
pub async fn list_contacts(state: &AppState, me: &str) -> MessagingResult<Vec<String>> {
    let mut contacts: BTreeSet<String> = state.user.list_emails().await?.into_iter().collect();
    contacts.extend(state.roles.known_addresses().map(str::to_string));
    contacts.remove(me);

    debug!(count = contacts.len(), "Contacts listed");
    Ok(contacts.into_iter().collect())
}

/// Makes `email` visible in other users' directories.
pub async fn register(state: &AppState, email: &str) -> MessagingResult<()> {
    state.user.register(email).await?;
    Ok(())
}
