//! API request and response types

use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::error;

use crate::conversation::ChatMessage;
use crate::conversation::ChatSession;
use crate::conversation::ConversationState;
use crate::errors::RagChatError;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Message submission
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// Session snapshot
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub state: ConversationState,
    pub messages: Vec<ChatMessage>,
}

impl From<&ChatSession> for SessionResponse {
    fn from(session: &ChatSession) -> Self {
        Self {
            session_id: session.id().to_string(),
            state: session.state(),
            messages: session.transcript().to_vec(),
        }
    }
}

/// Result of one turn
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub reply: ChatMessage,
    pub messages: Vec<ChatMessage>,
}

/// Cancellation result
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError(pub RagChatError);

impl From<RagChatError> for ApiError {
    fn from(err: RagChatError) -> Self {
        Self(err)
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RagChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            RagChatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RagChatError::SessionBusy(_) => StatusCode::CONFLICT,
            RagChatError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            // nginx's "client closed request"
            RagChatError::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST)
            }
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error: {}", self.0);
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}
