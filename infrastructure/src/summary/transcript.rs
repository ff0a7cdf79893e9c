//! Conversation titles from the transcript.
//!
//! The basic summary is the opening user message squeezed onto one line.
//! The model summary sends the transcript to one of the turn's respondents
//! and asks for a short title.

use async_trait::async_trait;
use chorus_application::{
    ChatRequest, ChatTransport, ModelRegistry, StreamDecoder, SummaryError, SummaryGenerator,
};
use chorus_domain::{ChatMessage, Conversation, ModelId, PromptTemplate, StreamEvent};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const BASIC_SUMMARY_CHARS: usize = 50;
const SUMMARY_TEMPERATURE: f32 = 0.3;
const REGENERATION_TEMPERATURE: f32 = 0.7;

/// [`SummaryGenerator`] that reuses the chat transport for title requests
pub struct TranscriptSummaryGenerator {
    transport: Arc<dyn ChatTransport>,
    registry: Arc<dyn ModelRegistry>,
    timeout: Duration,
}

impl TranscriptSummaryGenerator {
    pub fn new(transport: Arc<dyn ChatTransport>, registry: Arc<dyn ModelRegistry>) -> Self {
        Self {
            transport,
            registry,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn collect(&self, request: ChatRequest) -> Result<String, SummaryError> {
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();

        let mut stream = self
            .transport
            .stream_chat(request, cancel)
            .await
            .map_err(|e| SummaryError::RequestFailed(e.to_string()))?;

        let mut decoder = StreamDecoder::new();
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SummaryError::RequestFailed(e.to_string()))?;
            for event in decoder.push(&chunk) {
                if let StreamEvent::Delta(delta) = event {
                    text.push_str(&delta);
                }
            }
            if decoder.is_done() {
                break;
            }
        }
        for event in decoder.finish() {
            if let StreamEvent::Delta(delta) = event {
                text.push_str(&delta);
            }
        }
        Ok(text)
    }
}

/// Collapse whitespace and cut to `max` chars, marking the cut with `…`.
fn one_line(text: &str, max: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

fn clean_title(raw: &str) -> String {
    let line = raw.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    line.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '“' | '”'))
        .trim()
        .to_string()
}

#[async_trait]
impl SummaryGenerator for TranscriptSummaryGenerator {
    fn basic_summary(&self, chat: &Conversation) -> String {
        chat.ordered_messages()
            .iter()
            .find(|m| m.is_user())
            .map(|m| one_line(&m.content, BASIC_SUMMARY_CHARS))
            .unwrap_or_default()
    }

    async fn llm_summary(
        &self,
        chat: &Conversation,
        model: &ModelId,
        is_regeneration: bool,
    ) -> Result<String, SummaryError> {
        let respondent = self
            .registry
            .resolve(model)
            .ok_or_else(|| SummaryError::ModelUnavailable(model.to_string()))?;

        let messages = vec![
            ChatMessage::system(PromptTemplate::summary_system()),
            ChatMessage::user(PromptTemplate::summary_prompt(&chat.ordered_messages())),
        ];
        let temperature = if is_regeneration {
            REGENERATION_TEMPERATURE
        } else {
            SUMMARY_TEMPERATURE
        };
        let request = ChatRequest::for_respondent(&respondent, messages, temperature);
        debug!("Requesting title from {}", model);

        let raw = tokio::time::timeout(self.timeout, self.collect(request))
            .await
            .map_err(|_| {
                SummaryError::RequestFailed(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;
        Ok(clean_title(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chorus_application::{ByteStream, TransportError};
    use chorus_domain::{ChatId, Message, Respondent, Role};
    use std::sync::Mutex;

    struct FixedTransport {
        chunks: Vec<String>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl FixedTransport {
        fn replying(text: &str) -> Self {
            let chunk = format!(
                "data: {}\n\ndata: [DONE]\n\n",
                serde_json::json!({"choices": [{"delta": {"content": text}}]})
            );
            Self {
                chunks: vec![chunk],
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for FixedTransport {
        async fn stream_chat(
            &self,
            request: ChatRequest,
            _cancel: CancellationToken,
        ) -> Result<ByteStream, TransportError> {
            self.requests.lock().unwrap().push(request);
            let chunks: Vec<Result<Bytes, TransportError>> = self
                .chunks
                .iter()
                .map(|c| Ok(Bytes::from(c.clone())))
                .collect();
            Ok(futures::stream::iter(chunks).boxed())
        }
    }

    struct OneModel;

    impl ModelRegistry for OneModel {
        fn resolve(&self, id: &ModelId) -> Option<Respondent> {
            (id.as_str() == "gpt").then(|| Respondent::new("gpt", "http://localhost:9", "gpt-4o", ""))
        }

        fn model_ids(&self) -> Vec<ModelId> {
            vec![ModelId::new("gpt")]
        }
    }

    fn chat(first: &str) -> Conversation {
        let mut chat = Conversation::new(ChatId::new("c"), 0);
        chat.add_message(Message::user(first, 1)).unwrap();
        chat.add_message(Message::placeholder(ModelId::new("gpt"), 2).with_content("answer"))
            .unwrap();
        chat
    }

    fn generator(transport: Arc<FixedTransport>) -> TranscriptSummaryGenerator {
        TranscriptSummaryGenerator::new(transport, Arc::new(OneModel))
    }

    #[test]
    fn test_one_line_collapses_and_truncates() {
        assert_eq!(one_line("  hello\n  world ", 50), "hello world");
        let long = "a".repeat(60);
        let cut = one_line(&long, 50);
        assert_eq!(cut.chars().count(), 51);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_clean_title_strips_quotes() {
        assert_eq!(clean_title("\"Rust lifetimes\"\n"), "Rust lifetimes");
        assert_eq!(clean_title("\n  'Async traits'  "), "Async traits");
        assert_eq!(clean_title("   "), "");
    }

    #[test]
    fn test_basic_summary_uses_first_user_message() {
        let generator = generator(Arc::new(FixedTransport::replying("x")));
        assert_eq!(
            generator.basic_summary(&chat("What is\nownership?")),
            "What is ownership?"
        );
        assert_eq!(
            generator.basic_summary(&Conversation::new(ChatId::new("e"), 0)),
            ""
        );
    }

    #[tokio::test]
    async fn test_llm_summary_sends_transcript() {
        let transport = Arc::new(FixedTransport::replying("\"Ownership basics\""));
        let generator = generator(transport.clone());

        let title = generator
            .llm_summary(&chat("What is ownership?"), &ModelId::new("gpt"), false)
            .await
            .unwrap();

        assert_eq!(title, "Ownership basics");
        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model_name, "gpt-4o");
        assert_eq!(requests[0].temperature, SUMMARY_TEMPERATURE);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert!(requests[0].messages[1].content.contains("What is ownership?"));
    }

    #[tokio::test]
    async fn test_regeneration_raises_temperature() {
        let transport = Arc::new(FixedTransport::replying("Title"));
        let generator = generator(transport.clone());

        generator
            .llm_summary(&chat("q"), &ModelId::new("gpt"), true)
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, REGENERATION_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let generator = generator(Arc::new(FixedTransport::replying("x")));

        let result = generator
            .llm_summary(&chat("q"), &ModelId::new("missing"), false)
            .await;

        assert!(matches!(result, Err(SummaryError::ModelUnavailable(_))));
    }
}
