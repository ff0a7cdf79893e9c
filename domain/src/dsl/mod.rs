//! Phase-script (DSL) domain.
//!
//! - [`entities::DslConversation`] / [`entities::DslPhase`] - the script
//! - [`selector::ModelSelector`] / [`selector::ContextRule`] - per-phase rules
//! - [`execution::ExecutionContext`] - per-turn run state

pub mod entities;
pub mod execution;
pub mod selector;
