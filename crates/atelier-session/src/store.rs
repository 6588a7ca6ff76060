use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::{ChatMessage, ChatSession};
use crate::storage::SessionFile;

/// Immutable view of the whole session list. Mutations never touch a
/// handed-out snapshot, so readers can render from one without locking.
pub type Snapshot = Arc<Vec<ChatSession>>;

/// Owner of the session list.
///
/// Every mutation copies the list, applies one change, publishes the copy
/// as the new snapshot and rewrites the backing file wholesale. Storage
/// failures are logged and never fail the mutation; the in-memory state
/// is the source of truth for the running process.
pub struct SessionStore {
    sessions: RwLock<Snapshot>,
    storage: Option<SessionFile>,
}

impl SessionStore {
    /// Store without persistence, for tests and ephemeral use.
    pub fn in_memory() -> Self {
        Self {
            sessions: RwLock::new(Arc::new(Vec::new())),
            storage: None,
        }
    }

    /// Store backed by a session file. A file that cannot be read or
    /// parsed degrades to an empty list.
    pub async fn open(storage: SessionFile) -> Self {
        let sessions = match storage.load().await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::error!("Failed to load session store, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            sessions: RwLock::new(Arc::new(sessions)),
            storage: Some(storage),
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        Arc::clone(&*self.sessions.read().await)
    }

    pub async fn get(&self, session_id: Uuid) -> Option<ChatSession> {
        self.snapshot()
            .await
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
    }

    /// Create a session from the opening prompt: the user message plus the
    /// streaming model placeholder. Newest sessions sort first.
    pub async fn create_session(&self, prompt: &str, model: &str) -> Result<ChatSession> {
        self.mutate(|sessions| {
            let mut session = ChatSession::new(prompt, model);
            session.messages.push(ChatMessage::user(prompt));
            session.messages.push(ChatMessage::streaming_placeholder());
            sessions.insert(0, session.clone());
            Ok(session)
        })
        .await
    }

    /// Append a continuation prompt and a fresh streaming placeholder.
    /// Refused while a response is still streaming in the session.
    pub async fn append_prompt(&self, session_id: Uuid, prompt: &str) -> Result<ChatSession> {
        self.mutate(|sessions| {
            let session = find_session_mut(sessions, session_id)?;
            if session.streaming_message().is_some() {
                return Err(StoreError::StreamInFlight(session_id));
            }
            session.messages.push(ChatMessage::user(prompt));
            session.messages.push(ChatMessage::streaming_placeholder());
            Ok(session.clone())
        })
        .await
    }

    /// Extend the in-progress response by one delta.
    pub async fn append_chunk(&self, session_id: Uuid, text: &str) -> Result<()> {
        self.mutate(|sessions| {
            let session = find_session_mut(sessions, session_id)?;
            let message = streaming_message_mut(session, session_id)?;
            message.text.push_str(text);
            Ok(())
        })
        .await
    }

    /// Close the in-progress response. On error the partial output is kept
    /// and the error text is appended to it as visible model output before
    /// the streaming flag clears.
    pub async fn finish_stream(&self, session_id: Uuid, error: Option<&str>) -> Result<()> {
        self.mutate(|sessions| {
            let session = find_session_mut(sessions, session_id)?;
            let message = streaming_message_mut(session, session_id)?;
            if let Some(error) = error {
                message
                    .text
                    .push_str(&format!("\n\n**Error:** {}\nPlease resubmit your request.", error));
            }
            message.is_streaming = false;
            Ok(())
        })
        .await
    }

    pub async fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.mutate(|sessions| {
            let before = sessions.len();
            sessions.retain(|s| s.id != session_id);
            if sessions.len() == before {
                return Err(StoreError::SessionNotFound(session_id));
            }
            Ok(())
        })
        .await
    }

    pub async fn rename_session(&self, session_id: Uuid, title: &str) -> Result<ChatSession> {
        self.mutate(|sessions| {
            let session = find_session_mut(sessions, session_id)?;
            session.title = title.trim().to_string();
            Ok(session.clone())
        })
        .await
    }

    /// Apply one mutation under the write lock, publish the new snapshot
    /// and persist it. Failed mutations leave the snapshot untouched.
    async fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Vec<ChatSession>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.sessions.write().await;
        let mut next = (**guard).clone();

        let out = apply(&mut next)?;

        let snapshot: Snapshot = Arc::new(next);
        *guard = Arc::clone(&snapshot);

        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(&snapshot).await {
                tracing::error!("Failed to persist sessions: {}", e);
            }
        }

        Ok(out)
    }
}

fn find_session_mut(
    sessions: &mut [ChatSession],
    session_id: Uuid,
) -> Result<&mut ChatSession> {
    sessions
        .iter_mut()
        .find(|s| s.id == session_id)
        .ok_or(StoreError::SessionNotFound(session_id))
}

fn streaming_message_mut(
    session: &mut ChatSession,
    session_id: Uuid,
) -> Result<&mut ChatMessage> {
    session
        .messages
        .iter_mut()
        .find(|m| m.is_streaming)
        .ok_or(StoreError::NoStreamInFlight(session_id))
}
