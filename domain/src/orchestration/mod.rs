//! Conversation orchestration domain
//!
//! Mode definitions and the per-mode visibility/scheduling policies.

pub mod mode;
pub mod policy;
