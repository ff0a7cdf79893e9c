//! Engine parameters for turn execution.
//!
//! [`EngineConfig`] groups the static parameters used by the
//! [`ConversationOrchestrator`](crate::use_cases::send_turn::ConversationOrchestrator)
//! and each [`ResponseStreamController`](crate::streaming::controller::ResponseStreamController).

use chorus_domain::PromptTemplate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Write throttling thresholds for streamed responses.
///
/// A lightweight (UI) update is emitted when `ui_interval` has elapsed since
/// the last one or `ui_chars` characters are buffered; a persisted write when
/// `persist_interval` has elapsed or `persist_chars` characters are buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    pub ui_interval: Duration,
    pub persist_interval: Duration,
    pub ui_chars: usize,
    pub persist_chars: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            ui_interval: Duration::from_millis(200),
            persist_interval: Duration::from_millis(500),
            ui_chars: 1000,
            persist_chars: 2000,
        }
    }
}

/// Turn execution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base system prompt prepended to every request.
    pub system_prompt: String,
    /// Budget for a single response, measured from call start.
    pub response_timeout: Duration,
    pub throttle: ThrottleConfig,
    /// Generate a conversation summary after the first turn settles.
    pub generate_summary: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            system_prompt: PromptTemplate::default_system().to_string(),
            response_timeout: Duration::from_secs(30),
            throttle: ThrottleConfig::default(),
            generate_summary: true,
        }
    }
}

impl EngineConfig {
    // ==================== Builder Methods ====================

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_summary(mut self, enabled: bool) -> Self {
        self.generate_summary = enabled;
        self
    }
}
