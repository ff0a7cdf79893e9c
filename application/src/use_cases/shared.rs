//! Per-turn plumbing shared by the mode policies and the phase engine.
//!
//! A [`Turn`] owns everything one `send_turn` call needs: placeholder
//! creation, context snapshots, launching responses onto a `JoinSet`, and
//! the barrier that drains it.

use crate::ports::chat_transport::ChatRequest;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::conversation_store::ConversationStore;
use crate::ports::model_registry::ModelRegistry;
use crate::ports::progress::TurnProgressNotifier;
use crate::streaming::clock::MessageClock;
use crate::streaming::controller::{
    ResponseStreamController, StreamOutcome, StreamTarget, unknown_model_marker,
};
use crate::streaming::streaming_set::StreamingSet;
use chorus_domain::{
    ChatId, ChatMessage, DisplayNames, Message, MessageId, ModelId, StreamState,
};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// A placeholder reply waiting for its respondent
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub message_id: MessageId,
    pub model_id: ModelId,
    /// 0-based position of the respondent in the turn's candidate list
    pub index: usize,
}

/// Resolves a respondent and streams its reply. Cloned into each task.
#[derive(Clone)]
pub(crate) struct Responder {
    pub chat_id: ChatId,
    pub registry: Arc<dyn ModelRegistry>,
    pub store: Arc<dyn ConversationStore>,
    pub controller: ResponseStreamController,
    pub progress: Arc<dyn TurnProgressNotifier>,
    pub logger: Arc<dyn ConversationLogger>,
}

impl Responder {
    pub async fn respond(
        &self,
        slot: Slot,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> StreamOutcome {
        let outcome = match self.registry.resolve(&slot.model_id) {
            Some(respondent) => {
                let request = ChatRequest::for_respondent(&respondent, messages, temperature);
                let target = StreamTarget {
                    chat_id: self.chat_id.clone(),
                    message_id: slot.message_id.clone(),
                    model_id: slot.model_id.clone(),
                };
                match self.controller.run(target, request).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Skipping {}: {}", slot.message_id, e);
                        StreamOutcome {
                            message_id: slot.message_id,
                            model_id: slot.model_id,
                            state: StreamState::Errored,
                            content: String::new(),
                        }
                    }
                }
            }
            None => self.reject_unknown(slot).await,
        };

        self.logger.log(ConversationEvent::response_settled(
            self.chat_id.as_str(),
            outcome.message_id.as_str(),
            outcome.model_id.as_str(),
            outcome.state,
            outcome.content.chars().count(),
        ));
        outcome
    }

    /// Freeze the placeholder of an unresolvable model without streaming.
    async fn reject_unknown(&self, slot: Slot) -> StreamOutcome {
        warn!("Unknown model '{}'; skipping respondent", slot.model_id);
        let content = unknown_model_marker(&slot.model_id);
        if let Err(e) = self
            .store
            .update_message(&self.chat_id, &slot.message_id, &content)
            .await
        {
            warn!("Failed to persist message {}: {}", slot.message_id, e);
        }
        self.progress
            .on_stream_end(&slot.message_id, StreamState::Errored, &content);
        StreamOutcome {
            message_id: slot.message_id,
            model_id: slot.model_id,
            state: StreamState::Errored,
            content,
        }
    }
}

/// State of one `send_turn` call
pub(crate) struct Turn<'a> {
    pub chat_id: ChatId,
    pub user_message_id: MessageId,
    pub content: String,
    pub temperature: f32,
    pub candidates: Vec<ModelId>,
    pub names: DisplayNames,
    pub system_prompt: &'a str,
    pub clock: &'a MessageClock,
    pub streaming: StreamingSet,
    pub responder: Responder,
    placeholders: Mutex<Vec<Message>>,
}

impl<'a> Turn<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chat_id: ChatId,
        user_message_id: MessageId,
        content: String,
        temperature: f32,
        candidates: Vec<ModelId>,
        names: DisplayNames,
        system_prompt: &'a str,
        clock: &'a MessageClock,
        streaming: StreamingSet,
        responder: Responder,
    ) -> Self {
        Self {
            chat_id,
            user_message_id,
            content,
            temperature,
            candidates,
            names,
            system_prompt,
            clock,
            streaming,
            responder,
            placeholders: Mutex::new(Vec::new()),
        }
    }

    /// Placeholders created so far, in creation order
    pub fn placeholders(&self) -> Vec<Message> {
        self.placeholders
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Create one empty assistant message per `(candidate index, model)`.
    ///
    /// A placeholder the store refuses is dropped with a warning; the
    /// remaining respondents still run.
    pub async fn create_placeholders(
        &self,
        models: impl IntoIterator<Item = (usize, ModelId)>,
    ) -> Vec<Slot> {
        let mut slots = Vec::new();
        for (index, model_id) in models {
            let message = Message::placeholder(model_id.clone(), self.clock.next());
            let message_id = message.id.clone();
            if let Err(e) = self
                .responder
                .store
                .add_message(&self.chat_id, message.clone())
                .await
            {
                warn!("Failed to create placeholder for {}: {}", model_id, e);
                continue;
            }
            if let Ok(mut placeholders) = self.placeholders.lock() {
                placeholders.push(message);
            }
            slots.push(Slot {
                message_id,
                model_id,
                index,
            });
        }
        slots
    }

    /// Current conversation in timestamp order.
    ///
    /// An unreadable or empty conversation is logged and treated as having
    /// no context; the fallback user message keeps the request valid.
    pub async fn snapshot(&self) -> Vec<Message> {
        match self.responder.store.get_chat(&self.chat_id).await {
            Ok(chat) if chat.is_empty() => {
                warn!(
                    "Barrier inconsistency: store returned no messages for {}; proceeding",
                    self.chat_id
                );
                Vec::new()
            }
            Ok(chat) => chat.ordered_messages(),
            Err(e) => {
                warn!("Failed to read conversation {}: {}", self.chat_id, e);
                Vec::new()
            }
        }
    }

    /// Start a reply as an independent task.
    pub fn launch(
        &self,
        join_set: &mut JoinSet<StreamOutcome>,
        slot: Slot,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) {
        let responder = self.responder.clone();
        join_set.spawn(async move { responder.respond(slot, messages, temperature).await });
    }

    /// Run a reply to completion on the current task.
    pub async fn respond(
        &self,
        slot: Slot,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> StreamOutcome {
        self.responder.respond(slot, messages, temperature).await
    }

    /// Barrier: wait for every launched reply, then for the streaming set
    /// to drain.
    pub async fn settle(&self, join_set: &mut JoinSet<StreamOutcome>) -> Vec<StreamOutcome> {
        let mut outcomes = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("Response task join error: {}", e),
            }
        }
        self.streaming.wait_until_empty().await;
        outcomes
    }

    pub fn start_phase(&self, phase: &str, respondents: &[ModelId]) {
        info!("Phase '{}' with {} respondents", phase, respondents.len());
        self.responder.progress.on_phase_start(phase, respondents);
        let ids: Vec<String> = respondents.iter().map(|m| m.to_string()).collect();
        self.responder.logger.log(ConversationEvent::phase_started(
            self.chat_id.as_str(),
            phase,
            &ids,
        ));
    }

    pub fn finish_phase(&self, phase: &str) {
        info!("Phase '{}' complete", phase);
        self.responder.progress.on_phase_complete(phase);
    }
}

/// Build a chat request body: system prompt, visible context, and a fallback
/// user message when no user turn is visible.
pub(crate) fn chat_messages(
    system: &str,
    context: Vec<Message>,
    fallback: &str,
    responding: &ModelId,
) -> Vec<ChatMessage> {
    let has_user = context.iter().any(Message::is_user);

    let mut messages = Vec::with_capacity(context.len() + 2);
    if !system.is_empty() {
        messages.push(ChatMessage::system(system));
    }
    messages.extend(context.into_iter().map(|m| {
        if m.is_user() {
            ChatMessage::user(m.content)
        } else {
            ChatMessage::assistant(m.content)
        }
    }));

    if !has_user {
        warn!(
            "No user message visible to {}; injecting the current prompt",
            responding
        );
        messages.push(ChatMessage::user(fallback));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_domain::Role;

    #[test]
    fn test_chat_messages_maps_roles() {
        let context = vec![
            Message::user("hi", 1),
            Message::placeholder(ModelId::new("m1"), 2).with_content("hello"),
        ];

        let messages = chat_messages("sys", context, "hi", &ModelId::new("m2"));

        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(messages[2].content, "hello");
    }

    #[test]
    fn test_chat_messages_injects_fallback_user_turn() {
        let context = vec![Message::placeholder(ModelId::new("m1"), 2).with_content("hello")];

        let messages = chat_messages("sys", context, "original question", &ModelId::new("m1"));

        let last = messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "original question");
    }

    #[test]
    fn test_chat_messages_no_fallback_when_user_visible() {
        let messages = chat_messages("", vec![Message::user("q", 1)], "q", &ModelId::new("m"));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }
}
