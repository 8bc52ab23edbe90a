//! HTTP server implementation

use std::sync::Arc;

use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::conversation::ConversationLoop;
use crate::conversation::SessionManager;
use crate::rag::RagService;
use crate::Result;

/// Start the API server
pub async fn serve_api(
    config: &AppConfig,
    rag: Arc<RagService>,
    host: String,
    port: u16,
    enable_cors: bool,
) -> Result<()> {
    info!("🚀 Starting PersonaRAG chat server...");

    let sessions = Arc::new(SessionManager::new(
        config.conversation.session_timeout_secs,
    ));
    let _cleanup = sessions.spawn_cleanup();

    let state = AppState {
        sessions,
        conversation: Arc::new(ConversationLoop::from_config(rag, config)),
    };

    // Add middleware layers
    let mut app = routes::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    // Add CORS if enabled
    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    // Start server
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Chat page available at http://{}", addr);
    info!("📋 RESTful API available at http://{}/api", addr);
    info!("");
    info!("Available endpoints:");
    info!("  GET    /api/health                        - Health check");
    info!("  POST   /api/sessions                      - Create session");
    info!("  GET    /api/sessions/:id                  - Get transcript");
    info!("  DELETE /api/sessions/:id                  - End session");
    info!("  POST   /api/sessions/:id/messages         - Send message");
    info!("  POST   /api/sessions/:id/messages/stream  - Send message (SSE)");
    info!("  POST   /api/sessions/:id/cancel           - Cancel running turn");

    axum::serve(listener, app).await?;

    Ok(())
}
