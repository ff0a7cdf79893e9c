//! Application layer for chorus
//!
//! This crate contains use cases, port definitions, the response streaming
//! engine, and application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod streaming;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{EngineConfig, ThrottleConfig};
pub use ports::{
    chat_transport::{ByteStream, ChatRequest, ChatTransport, TransportError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    conversation_store::{ConversationStore, StoreError},
    model_registry::ModelRegistry,
    progress::{NoProgress, TurnProgressNotifier},
    summary::{SummaryError, SummaryGenerator},
};
pub use streaming::{
    controller::{ResponseStreamController, StreamOutcome, StreamTarget},
    decoder::StreamDecoder,
    streaming_set::StreamingSet,
};
pub use use_cases::dsl_engine::DslPhaseEngine;
pub use use_cases::send_turn::{
    ConversationOrchestrator, SendTurnError, SendTurnInput, SendTurnOutput,
};
pub use use_cases::summarize::SummaryUpdater;
