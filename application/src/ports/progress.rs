//! Progress notification port
//!
//! Defines the interface for reporting progress during a turn. The
//! lightweight (UI-relevant) stream writes go through here; persisted writes
//! go to the [`ConversationStore`](super::conversation_store::ConversationStore).

use chorus_domain::{MessageId, ModelId, StreamState};

/// Callback for progress updates during a turn
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait TurnProgressNotifier: Send + Sync {
    /// Called once the user message has been stored
    fn on_turn_start(&self, _mode: &str, _respondents: &[ModelId]) {}

    /// Called when a phase (or sub-round) starts
    fn on_phase_start(&self, _phase: &str, _respondents: &[ModelId]) {}

    /// Called when a phase (or sub-round) has been launched or has settled
    fn on_phase_complete(&self, _phase: &str) {}

    // ==================== Stream Callbacks ====================

    /// Called when a message enters `Streaming`.
    fn on_stream_start(&self, _message_id: &MessageId, _model: &ModelId) {}

    /// Called with the full accumulated content whenever the throttle opens.
    fn on_message_updated(&self, _message_id: &MessageId, _content: &str) {}

    /// Called once when a message reaches a terminal state.
    fn on_stream_end(&self, _message_id: &MessageId, _state: StreamState, _content: &str) {}

    /// Called when every reply of the turn has settled
    fn on_turn_complete(&self, _message_ids: &[MessageId]) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl TurnProgressNotifier for NoProgress {}
