use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use atelier::codeblock::{segments, Segment};
use atelier::session::{ChatMessage, ChatSession, Role};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub is_streaming: bool,
    /// Alternating prose / fenced-block units for chat rendering.
    pub segments: Vec<Segment>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub title: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Deserialize)]
pub struct RenameSessionRequest {
    pub title: String,
}

/// List all sessions, newest first
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<ListSessionsResponse> {
    let snapshot = state.store.snapshot().await;

    let sessions = snapshot
        .iter()
        .map(|session| SessionSummary {
            id: session.id,
            title: session.title.clone(),
            model: session.model.clone(),
            created_at: session.created_at,
            message_count: session.messages.len(),
        })
        .collect();

    Json(ListSessionsResponse { sessions })
}

/// Get a session with its messages, segmented for rendering
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .store
        .get(session_id)
        .await
        .ok_or(ApiError::SessionNotFound(session_id))?;

    Ok(Json(session_to_response(session)))
}

/// Delete a session
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rename a session
pub async fn rename_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<RenameSessionRequest>,
) -> ApiResult<Json<SessionResponse>> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let session = state.store.rename_session(session_id, &req.title).await?;
    Ok(Json(session_to_response(session)))
}

fn session_to_response(session: ChatSession) -> SessionResponse {
    SessionResponse {
        id: session.id,
        title: session.title,
        model: session.model,
        created_at: session.created_at,
        messages: session.messages.into_iter().map(message_to_response).collect(),
    }
}

fn message_to_response(message: ChatMessage) -> MessageResponse {
    let parts: Vec<Segment> = segments(&message.text);
    MessageResponse {
        id: message.id,
        role: message.role,
        text: message.text,
        timestamp: message.timestamp,
        is_streaming: message.is_streaming,
        segments: parts,
    }
}
