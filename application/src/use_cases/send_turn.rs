//! Send Turn use case
//!
//! Orchestrates one conversation turn: appends the user message, creates a
//! placeholder per respondent, streams every reply under the selected mode
//! policy (or phase script), and refreshes the summary after the first turn.

use crate::config::EngineConfig;
use crate::ports::chat_transport::ChatTransport;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::model_registry::ModelRegistry;
use crate::ports::progress::{NoProgress, TurnProgressNotifier};
use crate::ports::summary::SummaryGenerator;
use crate::streaming::clock::MessageClock;
use crate::streaming::controller::{ResponseStreamController, StreamOutcome};
use crate::streaming::streaming_set::StreamingSet;
use crate::use_cases::dsl_engine::DslPhaseEngine;
use crate::use_cases::shared::{Responder, Slot, Turn, chat_messages};
use crate::use_cases::summarize::SummaryUpdater;
use chorus_domain::{
    ChatId, Conversation, Message, MessageId, ModeSpec, ModelId, ModePolicy, PromptTemplate,
    Scheduling, policy_for,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Errors that abort a turn before any reply exists
#[derive(Error, Debug)]
pub enum SendTurnError {
    #[error("No respondents selected for this turn")]
    NoRespondents,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Input for the SendTurn use case
#[derive(Debug, Clone)]
pub struct SendTurnInput {
    pub chat_id: ChatId,
    pub content: String,
    /// Candidate respondents, in the order roles and selectors refer to
    pub respondents: Vec<ModelId>,
    pub temperature: f32,
    pub mode: ModeSpec,
}

impl SendTurnInput {
    pub fn new(chat_id: ChatId, content: impl Into<String>, respondents: Vec<ModelId>) -> Self {
        Self {
            chat_id,
            content: content.into(),
            respondents,
            temperature: 0.7,
            mode: ModeSpec::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_mode(mut self, mode: impl Into<ModeSpec>) -> Self {
        self.mode = mode.into();
        self
    }
}

/// Result of a settled turn
#[derive(Debug, Clone)]
pub struct SendTurnOutput {
    pub user_message_id: MessageId,
    /// Reply ids in creation (timestamp) order
    pub message_ids: Vec<MessageId>,
    /// Terminal state of each reply, in settle order
    pub outcomes: Vec<StreamOutcome>,
}

impl SendTurnOutput {
    pub fn outcome(&self, id: &MessageId) -> Option<&StreamOutcome> {
        self.outcomes.iter().find(|o| &o.message_id == id)
    }
}

/// Top-level entry point for conversation turns
pub struct ConversationOrchestrator {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn ConversationStore>,
    registry: Arc<dyn ModelRegistry>,
    summary: Option<Arc<dyn SummaryGenerator>>,
    logger: Arc<dyn ConversationLogger>,
    config: EngineConfig,
    clock: MessageClock,
    streaming: StreamingSet,
    cancel: CancellationToken,
}

impl ConversationOrchestrator {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn ConversationStore>,
        registry: Arc<dyn ModelRegistry>,
    ) -> Self {
        Self {
            transport,
            store,
            registry,
            summary: None,
            logger: Arc::new(NoConversationLogger),
            config: EngineConfig::default(),
            clock: MessageClock::new(),
            streaming: StreamingSet::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_summary(mut self, summary: Arc<dyn SummaryGenerator>) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Cancelling `token` ends in-flight replies with a cancellation marker.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Message ids whose responses are currently streaming
    pub fn streaming(&self) -> &StreamingSet {
        &self.streaming
    }

    /// Send a turn without progress reporting
    pub async fn send_turn(&self, input: SendTurnInput) -> Result<SendTurnOutput, SendTurnError> {
        self.send_turn_with_progress(input, Arc::new(NoProgress))
            .await
    }

    /// Send a turn with progress callbacks
    pub async fn send_turn_with_progress(
        &self,
        input: SendTurnInput,
        progress: Arc<dyn TurnProgressNotifier>,
    ) -> Result<SendTurnOutput, SendTurnError> {
        if input.respondents.is_empty() {
            return Err(SendTurnError::NoRespondents);
        }

        let chat = self.store.get_chat(&input.chat_id).await?;
        let first_turn = chat.user_message_count() == 0;

        let user_message = Message::user(input.content.clone(), self.clock.next());
        let user_message_id = user_message.id.clone();
        self.store
            .add_message(&input.chat_id, user_message.clone())
            .await?;

        info!(
            "Turn in {} mode with {} respondents",
            input.mode.label(),
            input.respondents.len()
        );
        progress.on_turn_start(&input.mode.label(), &input.respondents);
        let respondent_names: Vec<String> =
            input.respondents.iter().map(|m| m.to_string()).collect();
        self.logger.log(ConversationEvent::turn_started(
            input.chat_id.as_str(),
            &input.mode.label(),
            &respondent_names,
        ));

        let controller = ResponseStreamController::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.store),
            Arc::clone(&progress),
            self.streaming.clone(),
        )
        .with_timeout(self.config.response_timeout)
        .with_throttle(self.config.throttle)
        .with_cancellation(self.cancel.clone());

        let turn = Turn::new(
            input.chat_id.clone(),
            user_message_id.clone(),
            input.content.clone(),
            input.temperature,
            input.respondents.clone(),
            self.registry.display_names(),
            &self.config.system_prompt,
            &self.clock,
            self.streaming.clone(),
            Responder {
                chat_id: input.chat_id.clone(),
                registry: Arc::clone(&self.registry),
                store: Arc::clone(&self.store),
                controller,
                progress: Arc::clone(&progress),
                logger: Arc::clone(&self.logger),
            },
        );

        let outcomes = match &input.mode {
            ModeSpec::Fixed(mode) => {
                let policy = policy_for(*mode);
                self.run_policy(&turn, policy.as_ref()).await
            }
            ModeSpec::Dsl(script) => DslPhaseEngine::new(script).run(&turn).await,
        };

        // Turn barrier
        let pending = self.streaming.snapshot();
        if !pending.is_empty() {
            debug!("Turn barrier waiting on {} replies: {:?}", pending.len(), pending);
        }
        self.streaming.wait_until_empty().await;

        let placeholders = turn.placeholders();
        let message_ids: Vec<MessageId> = placeholders.iter().map(|m| m.id.clone()).collect();
        progress.on_turn_complete(&message_ids);
        let id_strings: Vec<String> = message_ids.iter().map(|m| m.to_string()).collect();
        self.logger.log(ConversationEvent::turn_completed(
            input.chat_id.as_str(),
            &id_strings,
        ));

        if first_turn
            && self.config.generate_summary
            && let Some(generator) = &self.summary
        {
            let snapshot = settled_snapshot(chat, user_message, placeholders, &outcomes);
            let model = summary_model(&outcomes, &input.respondents);
            SummaryUpdater::new(self.store.as_ref(), generator.as_ref(), self.logger.as_ref())
                .update(&input.chat_id, snapshot, &model, false)
                .await;
        } else {
            debug!("Skipping summary (first turn: {})", first_turn);
        }

        Ok(SendTurnOutput {
            user_message_id,
            message_ids,
            outcomes,
        })
    }

    async fn run_policy(&self, turn: &Turn<'_>, policy: &dyn ModePolicy) -> Vec<StreamOutcome> {
        let history = turn.snapshot().await;
        let selected: Vec<(usize, ModelId)> = policy
            .select_respondents(&history, &turn.candidates)
            .into_iter()
            .enumerate()
            .collect();

        match policy.scheduling() {
            Scheduling::Concurrent => {
                let slots = turn.create_placeholders(selected).await;
                let snapshot = turn.snapshot().await;
                let mut join_set = JoinSet::new();
                for slot in slots {
                    let messages = policy_context(turn, policy, &snapshot, &slot, None);
                    turn.launch(&mut join_set, slot, messages, turn.temperature);
                }
                turn.settle(&mut join_set).await
            }
            Scheduling::Sequential => {
                let slots = turn.create_placeholders(selected).await;
                let mut outcomes = Vec::with_capacity(slots.len());
                for slot in slots {
                    // Re-read so each respondent sees its predecessors' replies.
                    let snapshot = turn.snapshot().await;
                    let messages = policy_context(turn, policy, &snapshot, &slot, None);
                    outcomes.push(turn.respond(slot, messages, turn.temperature).await);
                }
                outcomes
            }
            Scheduling::Staged(stages) => {
                let models: Vec<ModelId> = selected.into_iter().map(|(_, m)| m).collect();
                let mut planned = Vec::with_capacity(stages.len());
                for stage in &stages {
                    let participants = stage.participants_from(&models);
                    let slots = turn
                        .create_placeholders(participants.into_iter().enumerate())
                        .await;
                    planned.push((stage, slots));
                }

                let mut outcomes = Vec::new();
                for (stage, slots) in planned {
                    let participants: Vec<ModelId> =
                        slots.iter().map(|s| s.model_id.clone()).collect();
                    turn.start_phase(stage.name, &participants);
                    let snapshot = turn.snapshot().await;
                    let mut join_set = JoinSet::new();
                    for slot in slots {
                        let messages =
                            policy_context(turn, policy, &snapshot, &slot, Some(stage.instruction));
                        turn.launch(&mut join_set, slot, messages, turn.temperature);
                    }
                    outcomes.extend(turn.settle(&mut join_set).await);
                    turn.finish_phase(stage.name);
                }
                outcomes
            }
        }
    }
}

fn policy_context(
    turn: &Turn<'_>,
    policy: &dyn ModePolicy,
    snapshot: &[Message],
    slot: &Slot,
    instruction: Option<&str>,
) -> Vec<chorus_domain::ChatMessage> {
    let visible = policy.filter_messages(
        snapshot,
        &slot.model_id,
        Some(&slot.message_id),
        &turn.names,
    );
    let role = policy
        .role_instruction(slot.index)
        .map(PromptTemplate::role_section);
    let system = PromptTemplate::compose_system([
        turn.system_prompt,
        instruction.unwrap_or_default(),
        role.as_deref().unwrap_or_default(),
    ]);
    chat_messages(&system, visible, &turn.content, &slot.model_id)
}

/// The conversation as this turn left it, built from memory.
fn settled_snapshot(
    mut chat: Conversation,
    user_message: Message,
    placeholders: Vec<Message>,
    outcomes: &[StreamOutcome],
) -> Conversation {
    let finals: HashMap<&MessageId, &str> = outcomes
        .iter()
        .map(|o| (&o.message_id, o.content.as_str()))
        .collect();

    let settled = std::iter::once(user_message).chain(placeholders.into_iter().map(|m| {
        match finals.get(&m.id) {
            Some(content) => m.clone().with_content(*content),
            None => m,
        }
    }));
    for message in settled {
        if let Err(e) = chat.add_message(message) {
            debug!("Snapshot skipped a message: {}", e);
        }
    }
    chat
}

/// First respondent that answered successfully, else the first candidate
fn summary_model(outcomes: &[StreamOutcome], respondents: &[ModelId]) -> ModelId {
    outcomes
        .iter()
        .find(|o| o.is_success())
        .map(|o| o.model_id.clone())
        .or_else(|| respondents.first().cloned())
        .unwrap_or_else(|| ModelId::new(""))
}
