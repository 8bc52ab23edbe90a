/// API request handlers
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::response::sse::Sse;
use axum::response::Html;
use axum::Json;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use tracing::warn;

use super::page::CHAT_PAGE;
use crate::api::types::ApiError;
use crate::api::types::ApiResponse;
use crate::api::types::CancelResponse;
use crate::api::types::HealthResponse;
use crate::api::types::MessageRequest;
use crate::api::types::SessionResponse;
use crate::api::types::TurnResponse;
use crate::conversation::ChatMessage;
use crate::conversation::ConversationLoop;
use crate::conversation::NullView;
use crate::conversation::Role;
use crate::conversation::SessionManager;
use crate::conversation::TranscriptView;
use crate::errors::RagChatError;
use crate::errors::Result;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub conversation: Arc<ConversationLoop>,
}

type TurnOutcome = (Result<ChatMessage>, Vec<ChatMessage>);
type SseItem = std::result::Result<Event, Infallible>;

/// Chat page
pub async fn index() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Create session (POST /api/sessions)
pub async fn create_session(State(state): State<AppState>) -> Json<ApiResponse<SessionResponse>> {
    let session = state.sessions.create_session();
    info!("POST /api/sessions -> {}", session.id());
    Json(ApiResponse::success(SessionResponse::from(&session)))
}

/// Get session transcript (GET /api/sessions/:id)
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> std::result::Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    let session = state.sessions.snapshot(&session_id).await?;
    Ok(Json(ApiResponse::success(SessionResponse::from(&session))))
}

/// End session (DELETE /api/sessions/:id)
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> std::result::Result<Json<ApiResponse<String>>, ApiError> {
    info!("DELETE /api/sessions/{}", session_id);
    if !state.sessions.delete_session(&session_id) {
        return Err(RagChatError::SessionNotFound(session_id).into());
    }
    Ok(Json(ApiResponse::success(session_id)))
}

/// Cancel the running turn (POST /api/sessions/:id/cancel)
pub async fn cancel_turn(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> std::result::Result<Json<ApiResponse<CancelResponse>>, ApiError> {
    info!("POST /api/sessions/{}/cancel", session_id);
    let cancelled = state.sessions.cancel(&session_id)?;
    Ok(Json(ApiResponse::success(CancelResponse { cancelled })))
}

/// Run one turn (POST /api/sessions/:id/messages)
pub async fn post_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> std::result::Result<Json<ApiResponse<TurnResponse>>, ApiError> {
    info!("POST /api/sessions/{}/messages", session_id);

    let turn = start_turn(&state, &session_id, req.content, NullView)?;
    let (result, messages) = turn
        .await
        .map_err(|e| RagChatError::Generation(format!("turn task failed: {e}")))?;
    let reply = result?;

    Ok(Json(ApiResponse::success(TurnResponse { reply, messages })))
}

/// Run one turn, streaming the transcript as it changes (POST /api/sessions/:id/messages/stream)
pub async fn post_message_stream(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> std::result::Result<Sse<impl Stream<Item = SseItem>>, ApiError> {
    info!("POST /api/sessions/{}/messages/stream", session_id);

    let (tx, rx) = mpsc::unbounded_channel();
    let view = SseView {
        tx: tx.clone(),
        rendered: None,
    };
    let turn = start_turn(&state, &session_id, req.content, view)?;

    tokio::spawn(async move {
        let event = match turn.await {
            Ok((Ok(reply), _)) => json_event("done", &reply),
            Ok((Err(e), _)) => error_event(ApiError(e)),
            Err(e) => error_event(ApiError(RagChatError::Generation(format!(
                "turn task failed: {e}"
            )))),
        };
        // The browser may already be gone
        let _ = tx.send(event);
    });

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok::<_, Infallible>(event), rx))
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Lock the session and run the turn on its own task
///
/// The turn keeps going when the HTTP connection drops, so the session
/// always ends the turn with an assistant message.
fn start_turn<V>(
    state: &AppState,
    session_id: &str,
    content: String,
    mut view: V,
) -> Result<JoinHandle<TurnOutcome>>
where
    V: TranscriptView + 'static,
{
    if content.trim().is_empty() {
        return Err(RagChatError::InvalidInput(
            "message must not be empty".to_string(),
        ));
    }

    let mut session = state.sessions.acquire(session_id)?;
    let cancel = state.sessions.begin_turn(session_id);
    let sessions = Arc::clone(&state.sessions);
    let conversation = Arc::clone(&state.conversation);
    let session_id = session_id.to_string();

    Ok(tokio::spawn(async move {
        let result = conversation
            .submit(&mut session, &content, &mut view, &cancel)
            .await;
        sessions.end_turn(&session_id);
        (result, session.transcript().to_vec())
    }))
}

/// Forwards transcript changes as server-sent events
struct SseView {
    tx: mpsc::UnboundedSender<Event>,
    rendered: Option<usize>,
}

impl TranscriptView for SseView {
    fn render(&mut self, transcript: &[ChatMessage]) {
        // Only messages appended during this turn are sent
        let from = self
            .rendered
            .unwrap_or_else(|| transcript.len().saturating_sub(1));
        for message in &transcript[from.min(transcript.len())..] {
            let name = match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            let _ = self.tx.send(json_event(name, message));
        }
        self.rendered = Some(transcript.len());
    }

    fn partial(&mut self, delta: &str) {
        let _ = self
            .tx
            .send(json_event("delta", &serde_json::json!({ "text": delta })));
    }
}

fn json_event<T: serde::Serialize>(name: &str, data: &T) -> Event {
    Event::default().event(name).json_data(data).unwrap_or_else(|e| {
        warn!("Failed to serialize {} event: {}", name, e);
        Event::default().event(name)
    })
}

fn error_event(err: ApiError) -> Event {
    let status = err.status().as_u16();
    json_event(
        "error",
        &serde_json::json!({ "status": status, "error": err.0.to_string() }),
    )
}
