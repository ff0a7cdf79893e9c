//! Summary generator port

use async_trait::async_trait;
use chorus_domain::{Conversation, ModelId};
use thiserror::Error;

/// Errors from model-generated summaries
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Summary model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Summary request failed: {0}")]
    RequestFailed(String),
}

/// Produces conversation summaries (titles).
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Cheap local summary; never touches the network.
    fn basic_summary(&self, chat: &Conversation) -> String;

    /// Model-written summary. Best-effort: callers ignore failures.
    async fn llm_summary(
        &self,
        chat: &Conversation,
        model: &ModelId,
        is_regeneration: bool,
    ) -> Result<String, SummaryError>;
}
