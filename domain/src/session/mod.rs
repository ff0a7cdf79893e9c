//! Chat-completion session domain.
//!
//! - [`entities::ChatMessage`] - a single message in a completion request
//! - [`stream::StreamEvent`] - decoded streaming events
//! - [`stream::StreamState`] - lifecycle of a streamed response

pub mod entities;
pub mod stream;
