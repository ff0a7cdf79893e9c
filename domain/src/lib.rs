//! Domain layer for chorus
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Turn
//!
//! One user submission and every assistant reply it produces. Replies are
//! created as empty placeholder [`Message`]s and filled in while the model's
//! response streams.
//!
//! ## Modes
//!
//! A [`ConversationMode`] decides who responds and what each respondent sees
//! (via a [`ModePolicy`]). A [`DslConversation`] replaces the fixed modes
//! with an ordered list of phases separated by barriers.

pub mod conversation;
pub mod core;
pub mod dsl;
pub mod orchestration;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use conversation::entities::{ChatId, Conversation, Message, MessageId, Sender};
pub use core::{
    error::DomainError,
    model::{ModelId, Respondent},
};
pub use dsl::{
    entities::{DslConversation, DslPhase},
    execution::ExecutionContext,
    selector::{ContextRule, ModelSelector},
};
pub use orchestration::{
    mode::{ConversationMode, ModeSpec},
    policy::{DisplayNames, ModePolicy, Scheduling, Stage, StageParticipants, policy_for},
};
pub use prompt::PromptTemplate;
pub use session::{
    entities::{ChatMessage, Role},
    stream::{StreamEvent, StreamState},
};
