//! Streaming chat-completion transport port
//!
//! Defines the narrow interface the engine uses to reach a model backend.
//! The transport returns the raw server-sent-event byte stream; decoding it
//! is the engine's job ([`StreamDecoder`](crate::streaming::decoder::StreamDecoder)).

use async_trait::async_trait;
use bytes::Bytes;
use chorus_domain::{ChatMessage, Respondent};
use futures::stream::BoxStream;
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while talking to a model backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("Request cancelled")]
    Cancelled,
}

/// Raw SSE body chunks
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// A single streaming chat-completion request
#[derive(Clone)]
pub struct ChatRequest {
    pub base_url: String,
    pub model_name: String,
    pub api_key: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn for_respondent(
        respondent: &Respondent,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> Self {
        Self {
            base_url: respondent.base_url.clone(),
            model_name: respondent.model_name.clone(),
            api_key: respondent.api_key.clone(),
            messages,
            temperature,
        }
    }
}

impl fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatRequest")
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .field("messages", &self.messages.len())
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Transport for streaming chat completions.
///
/// Implementations must stop reading and release the connection promptly
/// once `cancel` fires.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Start a streaming completion (`stream = true`).
    ///
    /// Resolves once response headers are received; errors here are
    /// connection failures or non-2xx statuses.
    async fn stream_chat(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ByteStream, TransportError>;
}
