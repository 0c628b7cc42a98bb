//! SSE framing: parse upstream event frames and format client-facing ones.
//!
//! The wire shape is the canonical `event: <name>\ndata: <json>\n\n`. Parsing
//! tolerates events with no explicit `event:` line by inferring the type from
//! the payload's own `type` field, same as the upstream Anthropic-compatible
//! surface this pattern is carried from.

use bytes::Bytes;
use serde_json::Value;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Guards against an upstream that never sends a frame delimiter.
const MAX_SSE_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// One client-facing SSE event, ready to be formatted by the inbound surface.
#[derive(Debug, Clone)]
pub struct ClientEvent {
    pub event: String,
    pub data: Value,
}

impl ClientEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Render as the canonical SSE wire bytes.
    pub fn to_bytes(&self) -> Bytes {
        let json = serde_json::to_string(&self.data).unwrap_or_else(|_| "{}".to_string());
        Bytes::from(format!("event: {}\ndata: {}\n\n", self.event, json))
    }
}

fn parse_sse_frame(frame: &str) -> Option<(String, Value)> {
    let mut event_type = String::new();
    let mut data_lines = Vec::new();

    for line in frame.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(value) = line.strip_prefix("event:") {
            event_type = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.trim().to_string());
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    let data: Value = serde_json::from_str(&data_lines.join("\n")).ok()?;

    if event_type.is_empty() {
        event_type = data.get("type").and_then(|v| v.as_str()).unwrap_or_default().to_string();
    }
    if event_type.is_empty() {
        return None;
    }

    Some((event_type, data))
}

/// Pull-based reader over an upstream SSE response: buffers raw bytes and
/// yields complete `(event_type, data)` frames one at a time.
pub struct UpstreamEventReader {
    stream: reqwest::Response,
    buffer: String,
    pending: std::collections::VecDeque<(String, Value)>,
    done: bool,
}

impl UpstreamEventReader {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            stream: response,
            buffer: String::new(),
            pending: std::collections::VecDeque::new(),
            done: false,
        }
    }

    /// Returns the next parsed event, or `None` once the upstream stream has
    /// ended and every buffered frame has been drained.
    pub async fn next_event(&mut self) -> OrchestratorResult<Option<(String, Value)>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }
            if self.done {
                return Ok(None);
            }

            let chunk = self.stream.chunk().await.map_err(|e| {
                OrchestratorError::TransportError(format!("upstream stream read error: {e}"))
            })?;

            match chunk {
                Some(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    self.buffer.push_str(&text);

                    if self.buffer.len() > MAX_SSE_BUFFER_SIZE {
                        return Err(OrchestratorError::ProtocolError(
                            "SSE buffer exceeded maximum size".to_string(),
                        ));
                    }

                    while let Some(frame_end) = self.buffer.find("\n\n") {
                        let frame: String = self.buffer.drain(..frame_end + 2).collect();
                        let frame = &frame[..frame.len() - 2];
                        if let Some(parsed) = parse_sse_frame(frame) {
                            self.pending.push_back(parsed);
                        }
                    }
                }
                None => {
                    self.done = true;
                    if !self.buffer.trim().is_empty() {
                        if let Some(parsed) = parse_sse_frame(&self.buffer) {
                            self.pending.push_back(parsed);
                        }
                        self.buffer.clear();
                    }
                }
            }
        }
    }
}

/// Reads a non-streaming `bytes_stream` into an `UpstreamEventReader`-compatible
/// source, used by tests that don't have a live `reqwest::Response`.
#[cfg(test)]
pub(crate) async fn drain_test_frames(raw: &str) -> Vec<(String, Value)> {
    let mut buffer = raw.to_string();
    let mut out = Vec::new();
    while let Some(frame_end) = buffer.find("\n\n") {
        let frame: String = buffer.drain(..frame_end + 2).collect();
        let frame = &frame[..frame.len() - 2];
        if let Some(parsed) = parse_sse_frame(frame) {
            out.push(parsed);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_basic_frame_with_explicit_event_name() {
        let frames = drain_test_frames("event: response.created\ndata: {\"response\":{\"id\":\"r1\"}}\n\n").await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, "response.created");
        assert_eq!(frames[0].1["response"]["id"], "r1");
    }

    #[tokio::test]
    async fn infers_event_name_from_payload_type_when_absent() {
        let frames = drain_test_frames("data: {\"type\":\"response.completed\"}\n\n").await;
        assert_eq!(frames[0].0, "response.completed");
    }

    #[tokio::test]
    async fn splits_multiple_frames_in_one_chunk() {
        let raw = "event: a\ndata: {}\n\nevent: b\ndata: {}\n\n";
        let frames = drain_test_frames(raw).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].0, "a");
        assert_eq!(frames[1].0, "b");
    }

    #[test]
    fn client_event_renders_canonical_wire_bytes() {
        let event = ClientEvent::new("conversation.ready", serde_json::json!({"id": 1}));
        let bytes = event.to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("event: conversation.ready\n"));
        assert!(text.ends_with("\n\n"));
    }
}
