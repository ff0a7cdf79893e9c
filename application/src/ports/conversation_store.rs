//! Conversation store port
//!
//! The sole persistence boundary of the engine.

use async_trait::async_trait;
use chorus_domain::{ChatId, Conversation, DomainError, Message, MessageId};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Persistence for conversations and their messages.
///
/// Writers address messages by id and never touch other messages.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get_chat(&self, id: &ChatId) -> Result<Conversation, StoreError>;

    async fn update_chat(&self, chat: Conversation) -> Result<(), StoreError>;

    async fn add_message(&self, chat_id: &ChatId, message: Message) -> Result<(), StoreError>;

    /// Overwrite one message's content (persisted stream write)
    async fn update_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        content: &str,
    ) -> Result<(), StoreError>;

    async fn update_summary(&self, chat_id: &ChatId, summary: &str) -> Result<(), StoreError>;
}
