//! API server handlers

use super::build_rag_service;
use crate::AppConfig;
use crate::Result;

pub async fn handle_serve(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
) -> Result<()> {
    use crate::api::serve_api;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let cors = cors || config.server.enable_cors;

    println!("🚀 Starting PersonaRAG Chat Server");
    println!("==================================\n");
    println!("📍 Host: {host}");
    println!("🔌 Port: {port}");
    println!("🌐 CORS: {}", if cors { "Enabled" } else { "Disabled" });
    println!();

    let rag = build_rag_service(config)?;
    serve_api(config, rag, host, port, cors).await
}
