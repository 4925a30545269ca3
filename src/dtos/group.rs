//! Group DTOs - Data Transfer Objects for ad-hoc private groups

use crate::messaging::GroupKey;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /groups`; the caller is added automatically
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateGroupDTO {
    #[validate(length(min = 1, message = "Select at least one member for the group"))]
    pub members: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GroupDTO {
    pub key: String,
    pub label: String,
    pub members: Vec<String>,
}

impl From<GroupKey> for GroupDTO {
    fn from(value: GroupKey) -> Self {
        Self {
            label: value.label(),
            members: value.members().map(str::to_string).collect(),
            key: value.as_str().to_string(),
        }
    }
}
