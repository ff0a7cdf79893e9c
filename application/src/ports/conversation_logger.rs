//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording turn events
//! (turn start, phase start, response outcomes, summaries) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing carries
//! human-readable diagnostics, while this port captures the turn timeline in a
//! machine-readable format (JSONL).

use chorus_domain::StreamState;
use serde_json::{Value, json};

/// A structured conversation event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "turn_started", "response_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn turn_started(chat_id: &str, mode: &str, respondents: &[String]) -> Self {
        Self::new(
            "turn_started",
            json!({ "chat_id": chat_id, "mode": mode, "respondents": respondents }),
        )
    }

    pub fn phase_started(chat_id: &str, phase: &str, respondents: &[String]) -> Self {
        Self::new(
            "phase_started",
            json!({ "chat_id": chat_id, "phase": phase, "respondents": respondents }),
        )
    }

    pub fn response_settled(
        chat_id: &str,
        message_id: &str,
        model: &str,
        state: StreamState,
        chars: usize,
    ) -> Self {
        let event_type = match state {
            StreamState::Completed => "response_completed",
            StreamState::Created
            | StreamState::Streaming
            | StreamState::Errored
            | StreamState::TimedOut => "response_failed",
        };
        Self::new(
            event_type,
            json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "model": model,
                "state": state.as_str(),
                "chars": chars,
            }),
        )
    }

    pub fn turn_completed(chat_id: &str, message_ids: &[String]) -> Self {
        Self::new(
            "turn_completed",
            json!({ "chat_id": chat_id, "message_ids": message_ids }),
        )
    }

    pub fn summary_updated(chat_id: &str, summary: &str, source: &str) -> Self {
        Self::new(
            "summary_updated",
            json!({ "chat_id": chat_id, "summary": summary, "source": source }),
        )
    }
}

/// Port for logging conversation events to a structured log.
///
/// `log` is synchronous and infallible; implementations swallow write errors.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
