//! In-memory conversation store

use async_trait::async_trait;
use chorus_application::{ConversationStore, StoreError};
use chorus_domain::{ChatId, Conversation, Message, MessageId};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// [`ConversationStore`] backed by a map behind an async `RwLock`.
///
/// Every write touches exactly one conversation, and message writes touch
/// exactly one message.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    chats: RwLock<HashMap<ChatId, Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty conversation and return its id
    pub async fn create_chat(&self) -> ChatId {
        let id = ChatId::generate();
        let chat = Conversation::new(id.clone(), Utc::now().timestamp_millis());
        self.chats.write().await.insert(id.clone(), chat);
        id
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_chat(&self, id: &ChatId) -> Result<Conversation, StoreError> {
        self.chats
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_chat(&self, chat: Conversation) -> Result<(), StoreError> {
        self.chats.write().await.insert(chat.id.clone(), chat);
        Ok(())
    }

    async fn add_message(&self, chat_id: &ChatId, message: Message) -> Result<(), StoreError> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::NotFound(chat_id.to_string()))?;
        chat.add_message(message)?;
        Ok(())
    }

    async fn update_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        content: &str,
    ) -> Result<(), StoreError> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::NotFound(chat_id.to_string()))?;
        chat.set_content(message_id, content, Utc::now().timestamp_millis())?;
        Ok(())
    }

    async fn update_summary(&self, chat_id: &ChatId, summary: &str) -> Result<(), StoreError> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::NotFound(chat_id.to_string()))?;
        chat.summary = summary.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_domain::{DomainError, ModelId};

    #[tokio::test]
    async fn test_create_and_add_messages() {
        let store = InMemoryConversationStore::new();
        let id = store.create_chat().await;

        store
            .add_message(&id, Message::user("hello", 1))
            .await
            .unwrap();

        let chat = store.get_chat(&id).await.unwrap();
        assert_eq!(chat.len(), 1);
        assert_eq!(chat.messages()[0].content, "hello");
    }

    #[tokio::test]
    async fn test_update_message_touches_only_target() {
        let store = InMemoryConversationStore::new();
        let id = store.create_chat().await;
        let a = Message::placeholder(ModelId::new("a"), 1);
        let b = Message::placeholder(ModelId::new("b"), 2);
        store.add_message(&id, a.clone()).await.unwrap();
        store.add_message(&id, b.clone()).await.unwrap();

        store.update_message(&id, &a.id, "from a").await.unwrap();

        let chat = store.get_chat(&id).await.unwrap();
        assert_eq!(chat.message(&a.id).unwrap().content, "from a");
        assert_eq!(chat.message(&b.id).unwrap().content, "");
        assert!(chat.last_updated >= 2);
    }

    #[tokio::test]
    async fn test_duplicate_message_rejected() {
        let store = InMemoryConversationStore::new();
        let id = store.create_chat().await;
        let message = Message::user("hi", 1);
        store.add_message(&id, message.clone()).await.unwrap();

        let result = store.add_message(&id, message).await;

        assert!(matches!(
            result,
            Err(StoreError::Domain(DomainError::DuplicateMessage(_)))
        ));
    }

    #[tokio::test]
    async fn test_missing_chat() {
        let store = InMemoryConversationStore::new();
        let result = store.get_chat(&ChatId::new("missing")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_summary() {
        let store = InMemoryConversationStore::new();
        let id = store.create_chat().await;

        store.update_summary(&id, "Title").await.unwrap();

        assert_eq!(store.get_chat(&id).await.unwrap().summary, "Title");
        let missing = store.update_summary(&ChatId::new("missing"), "x").await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }
}
