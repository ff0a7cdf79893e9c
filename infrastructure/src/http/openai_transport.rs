//! OpenAI-compatible streaming chat-completion transport.
//!
//! Posts to `{base_url}/chat/completions` with `stream: true` and hands the
//! raw SSE body back as a byte stream. The stream ends early when the
//! caller's cancellation token fires, which drops the connection.

use async_trait::async_trait;
use chorus_application::{ByteStream, ChatRequest, ChatTransport, TransportError};
use chorus_domain::ChatMessage;
use futures::StreamExt;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// reqwest-backed [`ChatTransport`]
#[derive(Debug, Clone)]
pub struct OpenAiChatTransport {
    client: reqwest::Client,
}

impl Default for OpenAiChatTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiChatTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Use a client with a connect timeout; the response budget itself is
    /// enforced by the engine.
    pub fn with_connect_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChatTransport for OpenAiChatTransport {
    async fn stream_chat(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ByteStream, TransportError> {
        let url = completions_url(&request.base_url);
        let body = CompletionBody {
            model: &request.model_name,
            messages: &request.messages,
            temperature: request.temperature,
            stream: true,
        };
        debug!("POST {} ({})", url, request.model_name);

        let mut builder = self.client.post(&url).json(&body);
        if !request.api_key.is_empty() {
            builder = builder.bearer_auth(&request.api_key);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            response = builder.send() => {
                response.map_err(|e| TransportError::Connection(e.to_string()))?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Stream(e.to_string())))
            .take_until(cancel.cancelled_owned());
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_application::StreamDecoder;
    use chorus_domain::StreamEvent;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the request head.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut data = Vec::new();
            let mut buf = vec![0u8; 16 * 1024];
            // Read the whole request so closing never resets the connection.
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&buf[..n]);
                if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&data[..end]).to_lowercase();
                    let length = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if data.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&data).to_string()
        });
        (base_url, handle)
    }

    fn request(base_url: &str) -> ChatRequest {
        ChatRequest {
            base_url: base_url.to_string(),
            model_name: "test-model".to_string(),
            api_key: "sk-test".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.5,
        }
    }

    #[test]
    fn test_completions_url_trims_slash() {
        assert_eq!(
            completions_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_body_serialization() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = CompletionBody {
            model: "gpt-4o",
            messages: &messages,
            temperature: 0.5,
            stream: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[tokio::test]
    async fn test_streams_sse_body() {
        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            sse.len(),
            sse
        );
        let (base_url, server) = serve_once(response).await;

        let mut stream = OpenAiChatTransport::new()
            .stream_chat(request(&base_url), CancellationToken::new())
            .await
            .unwrap();

        let mut decoder = StreamDecoder::new();
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            for event in decoder.push(&chunk.unwrap()) {
                if let StreamEvent::Delta(delta) = event {
                    text.push_str(&delta);
                }
            }
        }
        assert_eq!(text, "Hello");
        assert!(decoder.is_done());

        let head = server.await.unwrap();
        assert!(head.starts_with("POST /v1/chat/completions"));
        assert!(head.to_lowercase().contains("authorization: bearer sk-test"));
    }

    #[tokio::test]
    async fn test_non_success_status_carries_body() {
        let body = "{\"error\":\"invalid key\"}";
        let response = format!(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (base_url, _server) = serve_once(response).await;

        let result = OpenAiChatTransport::new()
            .stream_chat(request(&base_url), CancellationToken::new())
            .await;

        match result {
            Err(TransportError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid key"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let token = CancellationToken::new();
        token.cancel();

        let result = OpenAiChatTransport::new()
            .stream_chat(request("http://127.0.0.1:9/v1"), token)
            .await;

        assert!(matches!(result, Err(TransportError::Cancelled)));
    }
}
