//! Per-turn execution state of a phase script

use crate::conversation::entities::MessageId;
use std::collections::HashMap;

/// Progress of one phase-script run.
///
/// Created fresh for each turn and discarded when the turn ends.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    current_phase_index: usize,
    completed_phases: Vec<String>,
    phase_messages: HashMap<String, Vec<MessageId>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_phase_index(&self) -> usize {
        self.current_phase_index
    }

    pub fn completed_phases(&self) -> &[String] {
        &self.completed_phases
    }

    pub fn advance(&mut self) {
        self.current_phase_index += 1;
    }

    /// Record the messages a phase produced
    pub fn record_phase(&mut self, phase: &str, ids: Vec<MessageId>) {
        self.phase_messages
            .entry(phase.to_string())
            .or_default()
            .extend(ids);
    }

    pub fn complete_phase(&mut self, phase: &str) {
        self.completed_phases.push(phase.to_string());
    }

    pub fn messages_for(&self, phase: &str) -> Option<&[MessageId]> {
        self.phase_messages.get(phase).map(Vec::as_slice)
    }

    /// Messages of the most recently completed phase
    pub fn previous_phase_messages(&self) -> Option<&[MessageId]> {
        self.completed_phases
            .last()
            .and_then(|name| self.messages_for(name))
    }

    /// Messages of every recorded phase
    pub fn all_phase_messages(&self) -> impl Iterator<Item = &MessageId> {
        self.phase_messages.values().flatten()
    }
}
