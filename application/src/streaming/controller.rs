//! Per-message response streaming.
//!
//! A [`ResponseStreamController`] drives one assistant message through its
//! lifecycle (see [`StreamState`]): it registers the message in the
//! [`StreamingSet`], decodes the transport's byte stream, accumulates content
//! in memory, pushes throttled writes outward, and on any terminal event
//! flushes the final content unconditionally before releasing the id.

use crate::config::ThrottleConfig;
use crate::ports::chat_transport::{ChatRequest, ChatTransport};
use crate::ports::conversation_store::ConversationStore;
use crate::ports::progress::TurnProgressNotifier;
use crate::streaming::decoder::StreamDecoder;
use crate::streaming::streaming_set::StreamingSet;
use crate::streaming::throttle::{WriteDecision, WriteThrottle};
use chorus_domain::{ChatId, DomainError, MessageId, ModelId, StreamEvent, StreamState};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Marker appended to content when a response fails
pub fn error_marker(content: &str, message: &str) -> String {
    with_marker(content, &format!("[Error: {}]", message))
}

/// Marker appended to content when a response exceeds its time budget
pub fn timeout_marker(content: &str, timeout: Duration) -> String {
    with_marker(
        content,
        &format!("[Error: Response timed out after {}s]", timeout.as_secs()),
    )
}

/// Content of a placeholder whose model could not be resolved
pub fn unknown_model_marker(model: &ModelId) -> String {
    format!("[Error: Unknown model '{}']", model)
}

fn with_marker(content: &str, marker: &str) -> String {
    if content.is_empty() {
        marker.to_string()
    } else {
        format!("{}\n\n{}", content, marker)
    }
}

/// Final state of one response
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOutcome {
    pub message_id: MessageId,
    pub model_id: ModelId,
    pub state: StreamState,
    pub content: String,
}

impl StreamOutcome {
    pub fn is_success(&self) -> bool {
        self.state == StreamState::Completed
    }
}

/// Which message a controller writes to
#[derive(Debug, Clone)]
pub struct StreamTarget {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub model_id: ModelId,
}

enum Ending {
    Completed,
    Failed(String),
    TimedOut,
    Cancelled,
}

/// Drives single responses from `Created` to a terminal state.
///
/// Cheap to clone; each spawned response task gets its own handle.
#[derive(Clone)]
pub struct ResponseStreamController {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn ConversationStore>,
    progress: Arc<dyn TurnProgressNotifier>,
    streaming: StreamingSet,
    timeout: Duration,
    throttle: ThrottleConfig,
    cancel: CancellationToken,
}

impl ResponseStreamController {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn ConversationStore>,
        progress: Arc<dyn TurnProgressNotifier>,
        streaming: StreamingSet,
    ) -> Self {
        Self {
            transport,
            store,
            progress,
            streaming,
            timeout: Duration::from_secs(30),
            throttle: ThrottleConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    /// Cancelling `token` ends every in-flight response as `Errored`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Stream one response into `target`.
    ///
    /// Fails only when the message is already being streamed by another
    /// controller; every transport or timeout failure ends up in the
    /// returned outcome and the message content instead.
    pub async fn run(
        &self,
        target: StreamTarget,
        request: ChatRequest,
    ) -> Result<StreamOutcome, DomainError> {
        let mut state = StreamState::Created;
        let guard = self
            .streaming
            .try_enter(&target.message_id)
            .ok_or_else(|| DomainError::AlreadyStreaming(target.message_id.to_string()))?;
        state.transition(StreamState::Streaming)?;
        self.progress
            .on_stream_start(&target.message_id, &target.model_id);
        debug!(
            "Streaming {} from {} ({} messages)",
            target.message_id,
            target.model_id,
            request.messages.len()
        );

        // Child token: cancelling one call never touches the turn token.
        let call_token = self.cancel.child_token();
        let deadline = Instant::now() + self.timeout;
        let mut content = String::new();

        let ending = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Ending::Cancelled,
            _ = tokio::time::sleep_until(deadline) => Ending::TimedOut,
            ending = self.pump(&target, request, call_token.clone(), &mut content) => ending,
        };
        // Abort the transport in every case so no connection is left open.
        call_token.cancel();

        let (next, content) = match ending {
            Ending::Completed => (StreamState::Completed, content),
            Ending::Failed(message) => {
                warn!("Model {} failed: {}", target.model_id, message);
                (StreamState::Errored, error_marker(&content, &message))
            }
            Ending::TimedOut => {
                warn!(
                    "Model {} timed out after {:?}",
                    target.model_id, self.timeout
                );
                (StreamState::TimedOut, timeout_marker(&content, self.timeout))
            }
            Ending::Cancelled => {
                debug!("Response {} cancelled", target.message_id);
                (
                    StreamState::Errored,
                    error_marker(&content, "Response cancelled"),
                )
            }
        };
        state.transition(next)?;

        self.persist(&target, &content).await;
        self.progress
            .on_stream_end(&target.message_id, state, &content);
        guard.release();

        Ok(StreamOutcome {
            message_id: target.message_id,
            model_id: target.model_id,
            state,
            content,
        })
    }

    async fn pump(
        &self,
        target: &StreamTarget,
        request: ChatRequest,
        token: CancellationToken,
        content: &mut String,
    ) -> Ending {
        let mut stream = match self.transport.stream_chat(request, token).await {
            Ok(stream) => stream,
            Err(e) => return Ending::Failed(e.to_string()),
        };
        let mut decoder = StreamDecoder::new();
        let mut throttle = WriteThrottle::new(self.throttle, Instant::now());

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => return Ending::Failed(e.to_string()),
            };
            for event in decoder.push(&bytes) {
                if self.absorb(target, event, content, &mut throttle).await {
                    return Ending::Completed;
                }
            }
        }

        for event in decoder.finish() {
            if self.absorb(target, event, content, &mut throttle).await {
                return Ending::Completed;
            }
        }
        debug!("Stream for {} closed without [DONE]", target.message_id);
        Ending::Completed
    }

    /// Apply one decoded event. Returns true at end-of-stream.
    async fn absorb(
        &self,
        target: &StreamTarget,
        event: StreamEvent,
        content: &mut String,
        throttle: &mut WriteThrottle,
    ) -> bool {
        let text = match event {
            StreamEvent::Done => return true,
            StreamEvent::Delta(text) => text,
        };
        content.push_str(&text);

        match throttle.record(text.chars().count(), Instant::now()) {
            WriteDecision::Skip => {}
            WriteDecision::Notify => {
                self.progress.on_message_updated(&target.message_id, content);
            }
            WriteDecision::Persist => {
                self.persist(target, content).await;
                self.progress.on_message_updated(&target.message_id, content);
            }
        }
        false
    }

    async fn persist(&self, target: &StreamTarget, content: &str) {
        if let Err(e) = self
            .store
            .update_message(&target.chat_id, &target.message_id, content)
            .await
        {
            warn!("Failed to persist message {}: {}", target.message_id, e);
        }
    }
}
