//! Application-level configuration.
//!
//! - [`EngineConfig`]: system prompt, response timeout, summary flag
//! - [`ThrottleConfig`]: streamed-write throttling thresholds

pub mod engine_config;

pub use engine_config::{EngineConfig, ThrottleConfig};
