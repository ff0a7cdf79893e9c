//! Streaming events and the per-response stream lifecycle.
//!
//! [`StreamEvent`] is what a decoded server-sent-event stream yields.
//! [`StreamState`] is the lifecycle of a single assistant message while its
//! response streams in:
//!
//! ```text
//! Created ──► Streaming ──► Completed
//!                 │
//!                 ├───────► Errored
//!                 └───────► TimedOut
//! ```

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An event decoded from a streaming chat-completion response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    Delta(String),
    /// The server signalled end-of-stream (`data: [DONE]`).
    Done,
}

impl StreamEvent {
    /// Returns the text content if this is a Delta event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            StreamEvent::Done => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done)
    }
}

/// Lifecycle state of a streamed response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    /// Placeholder exists, no network activity yet
    Created,
    /// Network call active, content accumulating
    Streaming,
    Completed,
    Errored,
    TimedOut,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamState::Completed | StreamState::Errored | StreamState::TimedOut
        )
    }

    pub fn can_transition_to(&self, next: StreamState) -> bool {
        matches!(
            (self, next),
            (StreamState::Created, StreamState::Streaming)
                | (StreamState::Streaming, StreamState::Streaming)
                | (StreamState::Streaming, StreamState::Completed)
                | (StreamState::Streaming, StreamState::Errored)
                | (StreamState::Streaming, StreamState::TimedOut)
        )
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: StreamState) -> Result<(), DomainError> {
        if !self.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamState::Created => "created",
            StreamState::Streaming => "streaming",
            StreamState::Completed => "completed",
            StreamState::Errored => "errored",
            StreamState::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
