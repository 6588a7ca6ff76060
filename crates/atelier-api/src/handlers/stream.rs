use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, Sse},
        AppendHeaders, IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use atelier::llm::{build_request_messages, ApiMessage, ChatOptions, ChatRequest, StreamEvent};
use atelier::session::{ChatMessage, Role};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Events in flight between the transport task and the SSE response. The
/// producer awaits a free slot when the consumer lags; nothing is dropped.
const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Open a new session and stream the first response.
///
/// The session is created with the user message and a streaming model
/// placeholder; the transport task folds every delta into the placeholder
/// while the same events are re-broadcast to the caller as SSE.
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PromptRequest>,
) -> ApiResult<Response> {
    let prompt = req.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }

    let session = state
        .store
        .create_session(&prompt, &state.config.llm.model)
        .await?;

    tracing::info!(session_id = %session.id, "Session started");

    let rx = spawn_completion(state, session.id, prompt, Vec::new());
    Ok(sse_response(session.id, rx))
}

/// Continue an existing session and stream the response.
///
/// Prior completed turns accompany the request as history; the in-flight
/// placeholder is never part of it. Refused with a conflict while the
/// session is still streaming.
pub async fn continue_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<PromptRequest>,
) -> ApiResult<Response> {
    let prompt = req.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }

    let session = state
        .store
        .get(session_id)
        .await
        .ok_or(ApiError::SessionNotFound(session_id))?;

    let history: Vec<ApiMessage> = session.completed_messages().map(to_api_message).collect();

    // enforces the one-stream-per-session invariant under the store lock
    state.store.append_prompt(session_id, &prompt).await?;

    tracing::info!(session_id = %session_id, "Session continued");

    let rx = spawn_completion(state, session_id, prompt, history);
    Ok(sse_response(session_id, rx))
}

fn to_api_message(message: &ChatMessage) -> ApiMessage {
    match message.role {
        Role::User => ApiMessage::user(message.text.clone()),
        Role::Model => ApiMessage::assistant(message.text.clone()),
    }
}

/// Run the completion on its own task, returning the event receiver.
///
/// The task owns the upstream connection; it ends when a terminal event has
/// been delivered or the receiver is gone, releasing the transport either
/// way.
fn spawn_completion(
    state: Arc<AppState>,
    session_id: Uuid,
    prompt: String,
    history: Vec<ApiMessage>,
) -> mpsc::Receiver<StreamEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        if let Err(e) = run_completion(&state, session_id, &prompt, history, &tx).await {
            let message = e.to_string();
            tracing::warn!(session_id = %session_id, "Completion failed: {}", message);

            if let Err(store_err) = state.store.finish_stream(session_id, Some(&message)).await {
                tracing::error!(session_id = %session_id, "Failed to finalize stream: {}", store_err);
            }
            let _ = tx.send(StreamEvent::Error { message }).await;
        }
    });

    rx
}

async fn run_completion(
    state: &AppState,
    session_id: Uuid,
    prompt: &str,
    history: Vec<ApiMessage>,
    tx: &mpsc::Sender<StreamEvent>,
) -> anyhow::Result<()> {
    let llm = &state.config.llm;

    let messages = build_request_messages(llm.system_prompt(), &history, prompt, llm.history_cap);
    let request = ChatRequest::new(llm.model.clone(), messages).with_options(
        ChatOptions::new()
            .temperature(llm.temperature)
            .presence_penalty(llm.presence_penalty)
            .max_tokens(llm.max_tokens),
    );

    let mut stream = state.client.chat_stream(request).await?;

    while let Some(event) = stream.next().await {
        match &event {
            StreamEvent::Chunk { text } => {
                state.store.append_chunk(session_id, text).await?;
            }
            StreamEvent::Done => {
                state.store.finish_stream(session_id, None).await?;
            }
            StreamEvent::Error { message } => {
                state.store.finish_stream(session_id, Some(message)).await?;
            }
        }

        let terminal = event.is_terminal();

        if tx.send(event).await.is_err() {
            // consumer went away; close out the stream and drop the transport
            if !terminal {
                state.store.finish_stream(session_id, None).await?;
            }
            return Ok(());
        }

        if terminal {
            return Ok(());
        }
    }

    Ok(())
}

/// Re-encode decoder events as SSE for the browser, preceded by a `session`
/// event naming the session the stream belongs to.
fn sse_response(session_id: Uuid, rx: mpsc::Receiver<StreamEvent>) -> Response {
    let init = futures::stream::once(async move {
        Ok::<_, Infallible>(
            Event::default()
                .event("session")
                .json_data(serde_json::json!({ "session_id": session_id }))
                .unwrap(),
        )
    });

    let events = ReceiverStream::new(rx).map(|event| {
        let sse_event = match event {
            StreamEvent::Chunk { text } => Event::default()
                .event("chunk")
                .json_data(serde_json::json!({ "text": text })),
            StreamEvent::Done => Event::default()
                .event("done")
                .json_data(serde_json::json!({ "status": "completed" })),
            StreamEvent::Error { message } => Event::default()
                .event("error")
                .json_data(serde_json::json!({ "error": message })),
        };

        Ok::<Event, Infallible>(sse_event.unwrap())
    });

    (
        AppendHeaders([("x-session-id", session_id.to_string())]),
        Sse::new(init.chain(events)),
    )
        .into_response()
}
