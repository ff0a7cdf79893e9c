//! Post-turn summary refresh.
//!
//! Best-effort on every step: a failing store or summary model is logged and
//! the turn result is unaffected.

use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::conversation_store::ConversationStore;
use crate::ports::summary::SummaryGenerator;
use chorus_domain::{ChatId, Conversation, ModelId};
use tracing::{debug, info, warn};

/// Writes the basic summary, then tries to replace it with a model-written one.
pub struct SummaryUpdater<'a> {
    store: &'a dyn ConversationStore,
    generator: &'a dyn SummaryGenerator,
    logger: &'a dyn ConversationLogger,
}

impl<'a> SummaryUpdater<'a> {
    pub fn new(
        store: &'a dyn ConversationStore,
        generator: &'a dyn SummaryGenerator,
        logger: &'a dyn ConversationLogger,
    ) -> Self {
        Self {
            store,
            generator,
            logger,
        }
    }

    /// Refresh the summary of `chat_id`.
    ///
    /// `snapshot` is the caller's in-memory view of the settled conversation.
    /// If the store hands back an empty conversation the snapshot is written
    /// back instead of letting the summary run on nothing.
    pub async fn update(
        &self,
        chat_id: &ChatId,
        snapshot: Conversation,
        model: &ModelId,
        is_regeneration: bool,
    ) {
        let chat = self.refresh(chat_id, snapshot).await;

        let basic = self.generator.basic_summary(&chat);
        let basic = basic.trim();
        if !basic.is_empty() {
            self.write(chat_id, basic, "basic").await;
        }

        match self
            .generator
            .llm_summary(&chat, model, is_regeneration)
            .await
        {
            Ok(summary) if !summary.trim().is_empty() => {
                self.write(chat_id, summary.trim(), "model").await;
            }
            Ok(_) => debug!("Model summary was empty; keeping basic summary"),
            Err(e) => warn!("Summary generation failed: {}", e),
        }
    }

    async fn refresh(&self, chat_id: &ChatId, snapshot: Conversation) -> Conversation {
        match self.store.get_chat(chat_id).await {
            Ok(chat) if !chat.is_empty() => chat,
            Ok(_) => {
                warn!(
                    "Barrier inconsistency: store returned no messages for {}; restoring {} messages",
                    chat_id,
                    snapshot.len()
                );
                if let Err(e) = self.store.update_chat(snapshot.clone()).await {
                    warn!("Failed to restore conversation {}: {}", chat_id, e);
                }
                snapshot
            }
            Err(e) => {
                warn!("Failed to refresh conversation {}: {}", chat_id, e);
                snapshot
            }
        }
    }

    async fn write(&self, chat_id: &ChatId, summary: &str, source: &str) {
        match self.store.update_summary(chat_id, summary).await {
            Ok(()) => {
                info!("Summary ({}) for {}: {}", source, chat_id, summary);
                self.logger.log(ConversationEvent::summary_updated(
                    chat_id.as_str(),
                    summary,
                    source,
                ));
            }
            Err(e) => warn!("Failed to store summary for {}: {}", chat_id, e),
        }
    }
}
