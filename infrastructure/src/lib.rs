//! Infrastructure layer for chorus
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration and phase script loading.

pub mod config;
pub mod dsl;
pub mod http;
pub mod logging;
pub mod registry;
pub mod store;
pub mod summary;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileEngineConfig, FileLoggingConfig,
    FileModelConfig,
};
pub use dsl::{DslLoadError, DslLoader};
pub use http::OpenAiChatTransport;
pub use logging::JsonlConversationLogger;
pub use registry::ConfiguredModelRegistry;
pub use store::InMemoryConversationStore;
pub use summary::TranscriptSummaryGenerator;
