//! Server-sent-event decoder for OpenAI-compatible chat completion streams.
//!
//! Chunks arrive as arbitrary byte slices; a single `data:` line may be split
//! across several chunks, so bytes are buffered until a newline is seen.

use chorus_domain::StreamEvent;
use serde_json::Value;
use tracing::debug;

/// Incremental decoder: bytes in, [`StreamEvent`]s out.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `data: [DONE]` has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk and return every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = self.decode_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Decode whatever is left once the byte stream has closed.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line).into_iter().collect()
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<StreamEvent> {
        if self.done {
            return None;
        }

        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\r', '\n']);
        let data = line.strip_prefix("data:")?.trim_start();

        if data == "[DONE]" {
            self.done = true;
            return Some(StreamEvent::Done);
        }

        match serde_json::from_str::<Value>(data) {
            Ok(json) => delta_content(&json).map(StreamEvent::Delta),
            Err(e) => {
                debug!("Skipping malformed SSE line ({}): {}", e, data);
                None
            }
        }
    }
}

/// Extract `choices[0].delta.content`, ignoring empty deltas.
fn delta_content(json: &Value) -> Option<String> {
    json.get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_line(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": text}}]})
        )
    }

    #[test]
    fn test_decodes_deltas_and_done() {
        let mut decoder = StreamDecoder::new();
        let body = format!("{}{}data: [DONE]\n\n", delta_line("Hel"), delta_line("lo"));

        let events = decoder.push(body.as_bytes());

        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hel".to_string()),
                StreamEvent::Delta("lo".to_string()),
                StreamEvent::Done,
            ]
        );
        assert!(decoder.is_done());
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = StreamDecoder::new();
        let line = delta_line("split");
        let (a, b) = line.as_bytes().split_at(12);

        assert!(decoder.push(a).is_empty());
        assert_eq!(
            decoder.push(b),
            vec![StreamEvent::Delta("split".to_string())]
        );
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut decoder = StreamDecoder::new();
        let line = delta_line("héllo");
        let bytes = line.as_bytes();
        let cut = line.find('é').unwrap() + 1;

        assert!(decoder.push(&bytes[..cut]).is_empty());
        assert_eq!(
            decoder.push(&bytes[cut..]),
            vec![StreamEvent::Delta("héllo".to_string())]
        );
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        let mut decoder = StreamDecoder::new();
        let body = format!("data: {{\"choices\": [\n{}", delta_line("ok"));

        assert_eq!(
            decoder.push(body.as_bytes()),
            vec![StreamEvent::Delta("ok".to_string())]
        );
    }

    #[test]
    fn test_ignores_comments_role_only_and_crlf() {
        let mut decoder = StreamDecoder::new();
        let body = concat!(
            ": keep-alive\r\n",
            "event: message\r\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\r\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n",
        );

        assert_eq!(
            decoder.push(body.as_bytes()),
            vec![StreamEvent::Delta("x".to_string())]
        );
    }

    #[test]
    fn test_finish_flushes_trailing_line() {
        let mut decoder = StreamDecoder::new();
        let line = delta_line("tail");
        let unterminated = line.trim_end();

        assert!(decoder.push(unterminated.as_bytes()).is_empty());
        assert_eq!(
            decoder.finish(),
            vec![StreamEvent::Delta("tail".to_string())]
        );
    }

    #[test]
    fn test_nothing_after_done() {
        let mut decoder = StreamDecoder::new();
        let body = format!("data: [DONE]\n{}", delta_line("late"));

        assert_eq!(decoder.push(body.as_bytes()), vec![StreamEvent::Done]);
    }
}
