//! Turn timeline logging.
//!
//! [`JsonlConversationLogger`] appends each
//! [`ConversationEvent`](chorus_application::ConversationEvent) to a JSONL file.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;
