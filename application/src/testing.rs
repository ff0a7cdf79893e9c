//! Hand-written port mocks shared by the use-case tests.

use crate::ports::chat_transport::{ByteStream, ChatRequest, ChatTransport, TransportError};
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::model_registry::ModelRegistry;
use crate::ports::progress::TurnProgressNotifier;
use crate::ports::summary::{SummaryError, SummaryGenerator};
use crate::streaming::streaming_set::StreamingSet;
use async_trait::async_trait;
use bytes::Bytes;
use chorus_domain::{
    ChatId, Conversation, Message, MessageId, ModelId, Respondent, StreamState,
};
use futures::StreamExt;
use futures::stream;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub(crate) fn respondent(id: &str) -> Respondent {
    Respondent::new(id, "http://localhost:9", id, "test-key")
}

pub(crate) fn sse_delta(text: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"delta": {"content": text}}]})
    )
}

// ==================== Store ====================

#[derive(Default)]
pub(crate) struct MemoryStore {
    chats: tokio::sync::Mutex<HashMap<ChatId, Conversation>>,
    updates: Mutex<HashMap<MessageId, usize>>,
    empty_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, chat: Conversation) {
        self.chats.lock().await.insert(chat.id.clone(), chat);
    }

    pub async fn conversation(&self, id: &ChatId) -> Conversation {
        self.chats.lock().await.get(id).cloned().unwrap()
    }

    pub async fn content_of(&self, id: &MessageId) -> String {
        let chats = self.chats.lock().await;
        chats
            .values()
            .find_map(|c| c.message(id).map(|m| m.content.clone()))
            .unwrap()
    }

    pub fn update_count(&self, id: &MessageId) -> usize {
        self.updates.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    /// From now on, `get_chat` returns an empty conversation.
    pub fn return_empty_reads(&self) {
        self.empty_reads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn get_chat(&self, id: &ChatId) -> Result<Conversation, StoreError> {
        if self.empty_reads.load(Ordering::SeqCst) {
            return Ok(Conversation::new(id.clone(), 0));
        }
        self.chats
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_chat(&self, chat: Conversation) -> Result<(), StoreError> {
        self.chats.lock().await.insert(chat.id.clone(), chat);
        Ok(())
    }

    async fn add_message(&self, chat_id: &ChatId, message: Message) -> Result<(), StoreError> {
        let mut chats = self.chats.lock().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::NotFound(chat_id.to_string()))?;
        chat.add_message(message)?;
        Ok(())
    }

    async fn update_message(
        &self,
        chat_id: &ChatId,
        message_id: &MessageId,
        content: &str,
    ) -> Result<(), StoreError> {
        *self
            .updates
            .lock()
            .unwrap()
            .entry(message_id.clone())
            .or_default() += 1;
        let mut chats = self.chats.lock().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::NotFound(chat_id.to_string()))?;
        chat.set_content(message_id, content, 0)?;
        Ok(())
    }

    async fn update_summary(&self, chat_id: &ChatId, summary: &str) -> Result<(), StoreError> {
        let mut chats = self.chats.lock().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::NotFound(chat_id.to_string()))?;
        chat.summary = summary.to_string();
        Ok(())
    }
}

// ==================== Transport ====================

/// What a scripted model does when called
#[derive(Clone)]
pub(crate) enum Script {
    /// Stream the chunks, then `[DONE]`
    Reply(Vec<String>),
    /// Stream the chunks, then fail
    FailAfter(Vec<String>, TransportError),
    /// Stream the chunks, then never finish
    Hang(Vec<String>),
    /// Fail before any byte arrives
    Refuse(TransportError),
}

impl Script {
    pub fn reply(chunks: &[&str]) -> Self {
        Script::Reply(chunks.iter().map(|c| c.to_string()).collect())
    }

    pub fn fail_after(chunks: &[&str], error: TransportError) -> Self {
        Script::FailAfter(chunks.iter().map(|c| c.to_string()).collect(), error)
    }

    pub fn hang_after(chunks: &[&str]) -> Self {
        Script::Hang(chunks.iter().map(|c| c.to_string()).collect())
    }
}

/// One recorded transport call
#[derive(Clone)]
pub(crate) struct Call {
    pub request: ChatRequest,
    pub token: CancellationToken,
    /// Streaming-set contents when the call started
    pub in_flight: Vec<MessageId>,
    /// Stored messages when the call started (empty unless a store is observed)
    pub stored: Vec<Message>,
}

/// Transport that replays per-model scripts (keyed by model name).
///
/// Models without a script reply `"reply from <model>"`.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<Call>>,
    observed: Mutex<Option<StreamingSet>>,
    observed_store: Mutex<Option<(Arc<MemoryStore>, ChatId)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, model: &str, script: Script) -> Self {
        self.scripts.insert(model.to_string(), script);
        self
    }

    /// Record the contents of `set` at the start of every call.
    pub fn observe(&self, set: StreamingSet) {
        *self.observed.lock().unwrap() = Some(set);
    }

    /// Record the stored messages of `chat_id` at the start of every call.
    pub fn observe_store(&self, store: Arc<MemoryStore>, chat_id: ChatId) {
        *self.observed_store.lock().unwrap() = Some((store, chat_id));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, model: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.request.model_name == model)
            .collect()
    }

    pub fn all_calls_cancelled(&self) -> bool {
        self.calls().iter().all(|c| c.token.is_cancelled())
    }
}

fn body(chunks: &[String]) -> Vec<Result<Bytes, TransportError>> {
    chunks
        .iter()
        .map(|c| Ok(Bytes::from(sse_delta(c))))
        .collect()
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn stream_chat(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ByteStream, TransportError> {
        let in_flight = self
            .observed
            .lock()
            .unwrap()
            .as_ref()
            .map(StreamingSet::snapshot)
            .unwrap_or_default();
        let observed_store = self.observed_store.lock().unwrap().clone();
        let stored = match observed_store {
            Some((store, chat_id)) => store.conversation(&chat_id).await.messages().to_vec(),
            None => Vec::new(),
        };
        let script = self
            .scripts
            .get(&request.model_name)
            .cloned()
            .unwrap_or_else(|| Script::Reply(vec![format!("reply from {}", request.model_name)]));
        self.calls.lock().unwrap().push(Call {
            request,
            token: cancel,
            in_flight,
            stored,
        });

        match script {
            Script::Reply(chunks) => {
                let mut items = body(&chunks);
                items.push(Ok(Bytes::from_static(b"data: [DONE]\n\n")));
                Ok(stream::iter(items).boxed())
            }
            Script::FailAfter(chunks, error) => {
                let mut items = body(&chunks);
                items.push(Err(error));
                Ok(stream::iter(items).boxed())
            }
            Script::Hang(chunks) => Ok(stream::iter(body(&chunks))
                .chain(stream::pending())
                .boxed()),
            Script::Refuse(error) => Err(error),
        }
    }
}

// ==================== Registry ====================

pub(crate) struct StaticRegistry {
    models: Vec<Respondent>,
}

impl StaticRegistry {
    pub fn with_models(ids: &[&str]) -> Self {
        Self {
            models: ids.iter().map(|id| respondent(id)).collect(),
        }
    }
}

impl ModelRegistry for StaticRegistry {
    fn resolve(&self, id: &ModelId) -> Option<Respondent> {
        self.models.iter().find(|r| &r.model_id == id).cloned()
    }

    fn model_ids(&self) -> Vec<ModelId> {
        self.models.iter().map(|r| r.model_id.clone()).collect()
    }
}

// ==================== Progress ====================

#[derive(Default)]
pub(crate) struct RecordingProgress {
    events: Mutex<Vec<String>>,
    on_turn_complete: Mutex<Option<Arc<MemoryStore>>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the store return empty reads once the turn settles.
    pub fn empty_store_on_turn_complete(&self, store: Arc<MemoryStore>) {
        *self.on_turn_complete.lock().unwrap() = Some(store);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl TurnProgressNotifier for RecordingProgress {
    fn on_phase_start(&self, phase: &str, respondents: &[ModelId]) {
        self.push(format!("phase_start:{}:{}", phase, respondents.len()));
    }

    fn on_phase_complete(&self, phase: &str) {
        self.push(format!("phase_complete:{}", phase));
    }

    fn on_stream_start(&self, _message_id: &MessageId, model: &ModelId) {
        self.push(format!("stream_start:{}", model));
    }

    fn on_stream_end(&self, _message_id: &MessageId, state: StreamState, _content: &str) {
        self.push(format!("stream_end:{}", state));
    }

    fn on_turn_complete(&self, message_ids: &[MessageId]) {
        self.push(format!("turn_complete:{}", message_ids.len()));
        if let Some(store) = self.on_turn_complete.lock().unwrap().as_ref() {
            store.return_empty_reads();
        }
    }
}

// ==================== Summary ====================

pub(crate) struct StubSummary {
    basic: String,
    llm: Result<String, String>,
    calls: Mutex<Vec<(usize, bool)>>,
}

impl StubSummary {
    pub fn new(basic: &str, llm: Result<&str, &str>) -> Self {
        Self {
            basic: basic.to_string(),
            llm: llm.map(str::to_string).map_err(str::to_string),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(message count, is_regeneration)` per llm_summary call
    pub fn llm_calls(&self) -> Vec<(usize, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummaryGenerator for StubSummary {
    fn basic_summary(&self, _chat: &Conversation) -> String {
        self.basic.clone()
    }

    async fn llm_summary(
        &self,
        chat: &Conversation,
        _model: &ModelId,
        is_regeneration: bool,
    ) -> Result<String, SummaryError> {
        self.calls
            .lock()
            .unwrap()
            .push((chat.len(), is_regeneration));
        self.llm.clone().map_err(SummaryError::RequestFailed)
    }
}
