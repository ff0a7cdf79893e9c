//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dsl_engine;
pub mod send_turn;
pub(crate) mod shared;
pub mod summarize;
