//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Session endpoints
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/sessions/:id/cancel", post(handlers::cancel_turn))
        // Conversation turns
        .route("/sessions/:id/messages", post(handlers::post_message))
        .route(
            "/sessions/:id/messages/stream",
            post(handlers::post_message_stream),
        )
        .with_state(state)
}

/// Chat page plus the API under `/api`
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .nest("/api", api_routes(state))
}
