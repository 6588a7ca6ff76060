//! # Atelier - a streaming chat studio for single-file web apps
//!
//! Atelier drives a conversation with an OpenAI-compatible chat-completion
//! endpoint and turns the streamed answer into a live-previewable
//! single-file HTML application:
//!
//! - **atelier-llm**: streaming transport, SSE decoding into ordered text
//!   deltas, request assembly with a bounded history window
//! - **atelier-codeblock**: fenced-code extraction from partially received
//!   text, shared by the preview and the chat renderer
//! - **atelier-session**: session list with copy-on-write snapshots and
//!   flat-file persistence
//!
//! The `atelier-api` binary wires the three into an HTTP/SSE service.
//!
//! ## Decoding a completion stream
//!
//! ```rust,no_run
//! use atelier::prelude::*;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CompletionClient::new("https://text.pollinations.ai/openai", None)?;
//!
//!     let messages = build_request_messages(
//!         DEFAULT_SYSTEM_PROMPT,
//!         &[],
//!         "Build a landing page for a coffee shop",
//!         DEFAULT_HISTORY_CAP,
//!     );
//!     let mut stream = client
//!         .chat_stream(ChatRequest::new("openai", messages))
//!         .await?;
//!
//!     let mut answer = String::new();
//!     while let Some(event) = stream.next().await {
//!         match event {
//!             StreamEvent::Chunk { text } => answer.push_str(&text),
//!             StreamEvent::Done => break,
//!             StreamEvent::Error { message } => anyhow::bail!(message),
//!         }
//!     }
//!
//!     if let Some(block) = extract(&answer) {
//!         println!("got {} bytes of {}", block.code.len(), block.language);
//!     }
//!     Ok(())
//! }
//! ```

// Re-export all public APIs
pub use atelier_codeblock as codeblock;
pub use atelier_llm as llm;
pub use atelier_session as session;

// Re-export commonly used types
pub use atelier_codeblock::{extract, segments, ExtractedCode, Segment, DEFAULT_LANGUAGE};
pub use atelier_llm::{
    build_request_messages, ApiMessage, ApiRole, ChatClient, ChatOptions, ChatRequest,
    CompletionClient, EventStream, StreamEvent, DEFAULT_HISTORY_CAP, DEFAULT_SYSTEM_PROMPT,
};
pub use atelier_session::{
    ChatMessage, ChatSession, Role, SessionFile, SessionStore, Snapshot, StoreError,
};

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::codeblock::{extract, segments, ExtractedCode, Segment};
    pub use crate::llm::{
        build_request_messages, ApiMessage, ChatClient, ChatOptions, ChatRequest,
        CompletionClient, StreamEvent, DEFAULT_HISTORY_CAP, DEFAULT_SYSTEM_PROMPT,
    };
    pub use crate::session::{ChatMessage, ChatSession, Role, SessionStore};
    pub use anyhow::Result;
}
