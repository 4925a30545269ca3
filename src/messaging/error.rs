use thiserror::Error;

/// Failures of the messaging operations.
///
/// `Validation` aborts the operation before anything is written.
/// `Transport` wraps a store failure; callers decide whether to surface it
/// (user-initiated actions) or only log it (background recomputation).
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("transport failure: {0}")]
    Transport(#[from] sqlx::Error),
}

impl MessagingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Status code used when the error is reported to a client.
    pub fn status_code(&self) -> u16 {
        match self {
            MessagingError::Validation(_) => 400,
            MessagingError::Transport(_) => 503,
        }
    }
}

pub type MessagingResult<T> = Result<T, MessagingError>;
