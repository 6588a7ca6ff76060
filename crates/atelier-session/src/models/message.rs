use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One chat turn, owned by exactly one session.
///
/// While `is_streaming` is set the text grows monotonically as deltas
/// arrive; once the flag clears the message never changes again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_streaming: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
            is_streaming: false,
        }
    }

    /// Empty model message that will be filled in as the response streams.
    pub fn streaming_placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Model,
            text: String::new(),
            timestamp: Utc::now(),
            is_streaming: true,
        }
    }
}
