//! Entities module - Domain entities
//!
//! Every entity here mirrors a row persisted by the store, except
//! [`Principal`] which comes from the identity provider's token.

pub mod enums;
pub mod message;
pub mod user;

// Re-exports
pub use enums::{ChangeOp, MessageKind};
pub use message::Message;
pub use user::Principal;
