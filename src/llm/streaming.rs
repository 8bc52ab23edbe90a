//! Streaming response handling

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use futures::Stream;
use futures::StreamExt;

use crate::errors::RagChatError;
use crate::errors::Result;

/// Streaming response from LLM
pub struct StreamingResponse {
    stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
}

impl StreamingResponse {
    pub fn new(stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>) -> Self {
        Self { stream }
    }

    /// A response that is already complete
    pub fn from_text(text: String) -> Self {
        Self::new(Box::pin(futures::stream::once(async move { Ok(text) })))
    }

    /// Decode an Anthropic server-sent-event byte stream into text deltas
    pub fn from_sse<S, B, E>(bytes: S) -> Self
    where
        S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: Display + Send + 'static,
    {
        let state = SseState {
            bytes: Box::pin(bytes),
            buffer: Vec::new(),
            pending: VecDeque::new(),
            done: false,
        };

        let stream = futures::stream::unfold(state, |mut state| async move {
            loop {
                if let Some(item) = state.pending.pop_front() {
                    return Some((item, state));
                }
                if state.done {
                    return None;
                }
                match state.bytes.next().await {
                    Some(Ok(chunk)) => state.feed(chunk.as_ref()),
                    Some(Err(e)) => {
                        state
                            .pending
                            .push_back(Err(RagChatError::Generation(format!(
                                "Stream read error: {e}"
                            ))));
                        state.done = true;
                    }
                    None => state.done = true,
                }
            }
        });

        Self::new(Box::pin(stream))
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            result.push_str(&chunk?);
        }
        Ok(result)
    }

    /// Next text chunk, or `None` once the answer is complete
    pub async fn next_chunk(&mut self) -> Option<Result<String>> {
        self.stream.next().await
    }
}

struct SseState<S> {
    bytes: Pin<Box<S>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String>>,
    done: bool,
}

impl<S> SseState<S> {
    fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);

            match parse_sse_line(line.trim()) {
                SseLine::Delta(text) => self.pending.push_back(Ok(text)),
                SseLine::Error(message) => {
                    self.pending
                        .push_back(Err(RagChatError::Generation(message)));
                    self.done = true;
                    return;
                }
                SseLine::Stop => {
                    self.done = true;
                    return;
                }
                SseLine::Skip => {}
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum SseLine {
    Delta(String),
    Error(String),
    Stop,
    Skip,
}

fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Stop;
    }

    let Ok(event) = serde_json::from_str::<serde_json::Value>(data) else {
        return SseLine::Skip;
    };

    match event["type"].as_str().unwrap_or("") {
        "content_block_delta" if event["delta"]["type"] == "text_delta" => event["delta"]["text"]
            .as_str()
            .map_or(SseLine::Skip, |text| SseLine::Delta(text.to_string())),
        "message_stop" => SseLine::Stop,
        "error" => SseLine::Error(
            event["error"]["message"]
                .as_str()
                .unwrap_or("unknown stream error")
                .to_string(),
        ),
        _ => SseLine::Skip,
    }
}
