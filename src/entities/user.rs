//! Principal entity - Identity of the authenticated caller

use serde::{Deserialize, Serialize};

/// Authenticated principal as resolved from the bearer token.
/// Inserted into the request extensions by the authentication middleware.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub email: String,
}

impl Principal {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}
