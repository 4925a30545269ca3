//! Group Membership Registry - Ad-hoc private groups
//!
//! A group has no row of its own. Its identity is the [`GroupKey`], the
//! sorted participant list joined with [`GROUP_DELIMITER`], which doubles as
//! the membership record. A group "exists" once a message carries its key.

use super::conversation::Conversation;
use super::error::{MessagingError, MessagingResult};
use super::gateway;
use crate::core::AppState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, instrument, warn};

pub const GROUP_DELIMITER: char = ';';

/// Text of the system message that brings a group into existence.
pub const GROUP_CREATED_TEXT: &str = "Group chat created!";

/// Canonical identifier of an ad-hoc group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    /// Canonical key for `members ∪ {initiator}`.
    ///
    /// Member order and duplicates do not matter: the same final set always
    /// yields the same key, so two groups created independently with the
    /// same people are the same conversation.
    pub fn from_members<I, S>(initiator: &str, members: I) -> MessagingResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let initiator = initiator.trim();
        let mut participants = BTreeSet::new();
        for member in members {
            let member = member.as_ref().trim();
            if member.is_empty() || member == initiator {
                continue;
            }
            if member.contains(GROUP_DELIMITER) {
                return Err(MessagingError::validation(format!(
                    "Member '{}' contains the reserved '{}' character",
                    member, GROUP_DELIMITER
                )));
            }
            participants.insert(member.to_string());
        }

        if participants.is_empty() {
            return Err(MessagingError::validation(
                "Select at least one other member for the group",
            ));
        }
        participants.insert(initiator.to_string());

        let key = participants
            .into_iter()
            .collect::<Vec<_>>()
            .join(&GROUP_DELIMITER.to_string());
        Ok(Self(key))
    }

    /// Accepts an existing key as received from a client.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (!raw.is_empty()).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.0.split(GROUP_DELIMITER).filter(|m| !m.is_empty())
    }

    /// Exact token membership, never a substring match.
    pub fn contains(&self, email: &str) -> bool {
        self.members().any(|m| m == email)
    }

    /// Checks that a client-supplied key may carry a message from `sender`:
    /// canonical form (sorted, unique, no empty tokens), at least two
    /// members, and `sender` among them.
    pub fn check_sender(&self, sender: &str) -> MessagingResult<()> {
        let tokens: Vec<&str> = self.0.split(GROUP_DELIMITER).collect();
        if tokens.iter().any(|t| t.is_empty() || t.trim() != *t) {
            return Err(MessagingError::validation("Group key contains an empty member"));
        }
        if !tokens.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(MessagingError::validation(
                "Group key must list unique members in sorted order",
            ));
        }
        if tokens.len() < 2 {
            return Err(MessagingError::validation("A group needs at least two members"));
        }
        if !self.contains(sender) {
            return Err(MessagingError::validation("You are not a member of this group"));
        }
        Ok(())
    }

    /// Short label: the first two members, with an ellipsis for larger groups.
    pub fn label(&self) -> String {
        let members: Vec<&str> = self.members().collect();
        if members.len() > 2 {
            format!("{}...", members[..2].join(", "))
        } else {
            members.join(", ")
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every group key that lists `user` as a member, sorted and deduplicated.
#[instrument(skip(state))]
pub async fn list_groups(state: &AppState, user: &str) -> MessagingResult<Vec<GroupKey>> {
    let recipients = state.msg.find_group_recipients().await?;
    let groups: BTreeSet<GroupKey> = recipients
        .iter()
        .filter_map(|raw| GroupKey::parse(raw))
        .filter(|key| key.contains(user))
        .collect();

    debug!(count = groups.len(), "Groups listed for user");
    Ok(groups.into_iter().collect())
}

/// Creates (or re-opens, when the member set already exists) a private group
/// by posting the creation notice with the canonical key as recipient.
#[instrument(skip(state, members), fields(members = members.len()))]
pub async fn create_group(
    state: &AppState,
    initiator: &str,
    members: &[String],
) -> MessagingResult<GroupKey> {
    let key = GroupKey::from_members(initiator, members).inspect_err(|e| {
        warn!("Group creation rejected: {}", e);
    })?;

    gateway::send(
        state,
        initiator,
        &Conversation::group(key.clone()),
        GROUP_CREATED_TEXT,
    )
    .await?;

    info!(group = %key, "Group chat created");
    Ok(key)
}
