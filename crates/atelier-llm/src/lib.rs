pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod history;
pub mod openai;

pub use traits::{
    ChatClient,
    ChatRequest, ChatOptions,
};

pub use streaming::{StreamEvent, EventStream, decode_chat_stream, decode_byte_stream};
pub use buffer_utils::LineBuffer;
pub use openai::CompletionClient;
pub use types::{ApiMessage, ApiRole};
pub use history::{build_request_messages, DEFAULT_HISTORY_CAP, DEFAULT_SYSTEM_PROMPT};
