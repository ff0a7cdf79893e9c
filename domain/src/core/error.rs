//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No respondents selected for this turn")]
    NoRespondents,

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error("Duplicate message id: {0}")]
    DuplicateMessage(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Message is already streaming: {0}")]
    AlreadyStreaming(String),

    #[error("Invalid stream transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl DomainError {
    /// Check if this error concerns a single respondent's configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DomainError::NoRespondents | DomainError::UnknownModel(_)
        )
    }
}
