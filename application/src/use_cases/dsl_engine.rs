//! Phase script execution
//!
//! Runs the phases of a [`DslConversation`] in order. Each phase resolves
//! its respondents, builds per-respondent context under its visibility
//! rule, launches every reply concurrently, and (unless it opts out) waits
//! for the streaming set to drain before the next phase starts.

use crate::streaming::controller::StreamOutcome;
use crate::use_cases::shared::{Slot, Turn, chat_messages};
use chorus_domain::{
    ChatMessage, DslConversation, DslPhase, ExecutionContext, Message, ModelId, PromptTemplate,
};
use rand::Rng;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Executes a phase script for one turn.
pub struct DslPhaseEngine<'a> {
    script: &'a DslConversation,
}

impl<'a> DslPhaseEngine<'a> {
    pub fn new(script: &'a DslConversation) -> Self {
        Self { script }
    }

    /// Respondents of `phase`, paired with their candidate positions.
    pub fn resolve_phase<R: Rng>(
        phase: &DslPhase,
        candidates: &[ModelId],
        rng: &mut R,
    ) -> Vec<(usize, ModelId)> {
        if !phase.models.is_recognized() {
            warn!(
                "Unrecognized model selector '{}' in phase '{}'; using all models",
                phase.models, phase.name
            );
        }
        phase
            .models
            .resolve(candidates, rng)
            .into_iter()
            .enumerate()
            .map(|(i, model)| {
                let index = candidates.iter().position(|c| c == &model).unwrap_or(i);
                (index, model)
            })
            .collect()
    }

    pub(crate) async fn run(&self, turn: &Turn<'_>) -> Vec<StreamOutcome> {
        let phases = &self.script.phases;
        info!(
            "Running script '{}' ({} phases)",
            self.script.name,
            phases.len()
        );

        // Resolved up front so every placeholder exists before the first call.
        let resolved: Vec<Vec<(usize, ModelId)>> = {
            let mut rng = rand::thread_rng();
            phases
                .iter()
                .map(|phase| Self::resolve_phase(phase, &turn.candidates, &mut rng))
                .collect()
        };
        let mut planned = Vec::with_capacity(phases.len());
        for respondents in resolved {
            planned.push(turn.create_placeholders(respondents).await);
        }

        let mut context = ExecutionContext::new();
        let mut join_set = JoinSet::new();
        let mut outcomes = Vec::new();

        for (phase, slots) in phases.iter().zip(planned) {
            let number = context.current_phase_index();
            let respondents: Vec<ModelId> = slots.iter().map(|s| s.model_id.clone()).collect();
            turn.start_phase(&phase.name, &respondents);

            let snapshot = turn.snapshot().await;
            let temperature = phase.temperature.unwrap_or(turn.temperature);
            let ids = slots.iter().map(|s| s.message_id.clone()).collect();
            for slot in slots {
                let messages = self.phase_context(turn, &context, phase, number, &snapshot, &slot);
                turn.launch(&mut join_set, slot, messages, temperature);
            }
            context.record_phase(&phase.name, ids);
            context.complete_phase(&phase.name);

            let is_last = number + 1 == phases.len();
            if phase.wait_for_completion && !is_last {
                outcomes.extend(turn.settle(&mut join_set).await);
            }
            turn.finish_phase(&phase.name);
            context.advance();
        }

        outcomes.extend(turn.settle(&mut join_set).await);
        outcomes
    }

    fn phase_context(
        &self,
        turn: &Turn<'_>,
        context: &ExecutionContext,
        phase: &DslPhase,
        number: usize,
        snapshot: &[Message],
        slot: &Slot,
    ) -> Vec<ChatMessage> {
        let visible = phase
            .context
            .filter(snapshot, context, Some(&slot.message_id), &turn.names);
        let visible: Vec<Message> = match &phase.prompt {
            Some(prompt) => visible
                .into_iter()
                .map(|m| {
                    if m.id == turn.user_message_id {
                        m.with_content(prompt.clone())
                    } else {
                        m
                    }
                })
                .collect(),
            None => visible,
        };

        let banner = PromptTemplate::phase_banner(
            &self.script.name,
            self.script.description.as_deref(),
            &phase.name,
            number + 1,
            self.script.phases.len(),
        );
        let role = self
            .script
            .role_for(phase, slot.index)
            .map(PromptTemplate::role_section);
        let system = PromptTemplate::compose_system([
            turn.system_prompt,
            self.script.global_prompt.as_deref().unwrap_or_default(),
            banner.as_str(),
            role.as_deref().unwrap_or_default(),
        ]);

        let fallback = phase.prompt.as_deref().unwrap_or(&turn.content);
        chat_messages(&system, visible, fallback, &slot.model_id)
    }
}
