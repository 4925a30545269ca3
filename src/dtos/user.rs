//! User DTOs - Data Transfer Objects for the current principal

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PrincipalDTO {
    pub email: String,
    pub role: String,
}
