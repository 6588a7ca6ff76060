use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::{ChatMessage, Role};

/// Characters of the first prompt used for the derived session title.
const TITLE_PREFIX_LEN: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub title: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create an empty session titled after the opening prompt.
    pub fn new(prompt: &str, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: derive_title(prompt),
            model: model.into(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The message currently receiving deltas, if any. The store guarantees
    /// it is the last message of the session.
    pub fn streaming_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.is_streaming)
    }

    /// Most recent model message, streaming or not. Its text is what the
    /// preview and code views derive from.
    pub fn last_model_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::Model)
    }

    /// Completed turns, oldest first: the raw material for the history of
    /// a continuation request. The in-progress placeholder is excluded.
    pub fn completed_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| !m.is_streaming)
    }
}

fn derive_title(prompt: &str) -> String {
    let mut title: String = prompt.chars().take(TITLE_PREFIX_LEN).collect();
    if prompt.chars().nth(TITLE_PREFIX_LEN).is_some() {
        title.push_str("...");
    }
    title
}
