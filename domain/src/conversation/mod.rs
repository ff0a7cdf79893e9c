//! Conversation domain.
//!
//! - [`entities::Conversation`] - an ordered message log with summary metadata
//! - [`entities::Message`] - a single user or assistant message

pub mod entities;
