//! HTTP adapters

mod openai_transport;

pub use openai_transport::OpenAiChatTransport;
