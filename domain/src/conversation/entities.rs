//! Conversation domain entities

use crate::core::error::DomainError;
use crate::core::model::ModelId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a message within a conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A message in a conversation (Entity)
///
/// The timestamp (milliseconds since the Unix epoch) is assigned at creation
/// and never changes. It is the only ordering key consumers rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub content: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<ModelId>,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: MessageId::generate(),
            sender: Sender::User,
            content: content.into(),
            timestamp,
            model_id: None,
        }
    }

    /// Create an empty assistant message that a stream will fill in later.
    pub fn placeholder(model_id: ModelId, timestamp: i64) -> Self {
        Self {
            id: MessageId::generate(),
            sender: Sender::Assistant,
            content: String::new(),
            timestamp,
            model_id: Some(model_id),
        }
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = id;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }

    /// Whether this message was authored by the given model
    pub fn is_from(&self, model: &ModelId) -> bool {
        self.model_id.as_ref() == Some(model)
    }
}

/// A conversation: an insertion-ordered message log plus metadata (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ChatId,
    messages: Vec<Message>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub starred: bool,
    pub last_updated: i64,
}

impl Conversation {
    pub fn new(id: ChatId, now: i64) -> Self {
        Self {
            id,
            messages: Vec::new(),
            summary: String::new(),
            starred: false,
            last_updated: now,
        }
    }

    /// Messages in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages sorted by `(timestamp, insertion index)`
    pub fn ordered_messages(&self) -> Vec<Message> {
        let mut indexed: Vec<(usize, &Message)> = self.messages.iter().enumerate().collect();
        indexed.sort_by_key(|(i, m)| (m.timestamp, *i));
        indexed.into_iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user()).count()
    }

    /// Append a message. Ids must be unique within the conversation.
    pub fn add_message(&mut self, message: Message) -> Result<(), DomainError> {
        if self.message(&message.id).is_some() {
            return Err(DomainError::DuplicateMessage(message.id.to_string()));
        }
        self.last_updated = self.last_updated.max(message.timestamp);
        self.messages.push(message);
        Ok(())
    }

    /// Overwrite the content of a single message, addressed by id.
    pub fn set_content(
        &mut self,
        id: &MessageId,
        content: impl Into<String>,
        now: i64,
    ) -> Result<(), DomainError> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| DomainError::MessageNotFound(id.to_string()))?;
        message.content = content.into();
        self.last_updated = self.last_updated.max(now);
        Ok(())
    }
}
