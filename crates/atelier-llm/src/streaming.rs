use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::buffer_utils::LineBuffer;

/// Events produced while decoding a completion stream.
///
/// `Done` and `Error` are terminal: exactly one of them ends every stream
/// and no `Chunk` follows either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Chunk { text: String },
    Done,
    Error { message: String },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// One SSE frame of a streamed chat completion. Only the delta content is
/// of interest; unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatStreamChunk {
    /// The incremental text delta, i.e. `choices[0].delta.content`.
    pub fn content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.delta.content.as_deref())
    }
}

/// Decode the body of a streamed chat-completion response.
pub fn decode_chat_stream(response: Response) -> EventStream {
    decode_byte_stream(response.bytes_stream())
}

/// Decode an SSE chat-completion stream from any fallible byte source.
///
/// Input may be fragmented at arbitrary byte boundaries; only complete
/// lines are ever parsed, so the emitted chunk sequence is identical for
/// every fragmentation of the same bytes. Lines that are not valid
/// `data: {json}` frames are dropped silently. The sentinel line
/// `data: [DONE]` terminates the stream with `Done` and is never parsed as
/// JSON; source exhaustion without the sentinel also yields `Done`. A
/// failing read yields a terminal `Error`.
pub fn decode_byte_stream<S, B, E>(stream: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = LineBuffer::with_capacity(4096);

        while let Some(chunk_result) = byte_chunks.next().await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield StreamEvent::Error {
                        message: format!("stream error: {}", e),
                    };
                    return;
                }
            };

            buffer.extend(bytes.as_ref());

            while let Some(line) = buffer.next_line() {
                if line.is_empty() {
                    continue;
                }

                if let Some(data) = line.strip_prefix("data: ") {
                    if data == "[DONE]" {
                        yield StreamEvent::Done;
                        return;
                    }

                    match serde_json::from_str::<ChatStreamChunk>(data) {
                        Ok(chunk) => {
                            if let Some(text) = chunk.content() {
                                if !text.is_empty() {
                                    yield StreamEvent::Chunk {
                                        text: text.to_string(),
                                    };
                                }
                            }
                        }
                        Err(e) => {
                            // partial or corrupt frame; recovered, not fatal
                            tracing::debug!("dropping malformed SSE frame: {}", e);
                        }
                    }
                }
            }
        }

        yield StreamEvent::Done;
    })
}
