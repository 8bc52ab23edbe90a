//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `personarag` CLI

use crate::config::Credentials;
pub use crate::rag::context::truncate_str;
use crate::retrieval::RetrievedPassage;
use crate::AppConfig;

/// Print retrieved passages with a short preview of each
pub fn print_sources(sources: &[RetrievedPassage]) {
    println!("📚 Sources ({} passages):", sources.len());
    for (idx, source) in sources.iter().enumerate() {
        println!(
            "  {}. {} (score: {:.2})",
            idx + 1,
            source.source_id.as_deref().unwrap_or("Unknown"),
            source.score
        );
        if let Some(text) = &source.text {
            println!("     {}", truncate_str(&text.replace('\n', " "), 100));
        }
    }
}

pub fn print_config(config: &AppConfig, credentials: &Credentials) {
    println!("📋 PersonaRAG Configuration:");
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Directory: {}", config.logging.directory);
    println!();

    println!("🌐 Server:");
    println!("  Bind address: {}", config.bind_address());
    println!("  CORS: {}", config.server.enable_cors);
    println!("  Request timeout: {}s", config.http.request_timeout_secs);
    println!();

    println!("🧠 Embeddings:");
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  Model: {}", crate::embeddings::EMBEDDING_MODEL);
    println!("  Dimension: {}", config.embeddings.dimension);
    println!();

    println!("🔍 Retrieval:");
    println!("  Index: {}", crate::retrieval::INDEX_NAME);
    println!("  Controller: {}", config.retrieval.controller_endpoint);
    println!(
        "  Index host: {}",
        config
            .retrieval
            .index_host
            .as_deref()
            .unwrap_or("(resolved on first query)")
    );
    println!("  Top K: {}", config.top_k());
    println!();

    println!("🤖 LLM:");
    println!("  Endpoint: {}", config.llm.endpoint);
    println!("  Model: {}", crate::llm::CHAT_MODEL);
    println!("  Streaming: {}", config.llm.stream);
    println!();

    println!("🧩 Context:");
    println!("  Max context chars: {}", config.context.max_context_chars);
    println!("  Min chunk chars: {}", config.context.min_chunk_chars);
    println!();

    println!("💬 Conversation:");
    println!("  Turn timeout: {}s", config.conversation.turn_timeout_secs);
    println!(
        "  Session timeout: {}s",
        config.conversation.session_timeout_secs
    );
    println!();

    println!("🔑 Credentials ({}):", config.secrets.path);
    println!("  OpenAI: {}", key_status(credentials.openai_api_key.as_deref()));
    println!(
        "  Anthropic: {}",
        key_status(credentials.anthropic_api_key.as_deref())
    );
    println!(
        "  Pinecone: {}",
        key_status(credentials.pinecone_api_key.as_deref())
    );
}

/// Show that a key is set without revealing it
fn key_status(key: Option<&str>) -> String {
    match key {
        Some(key) if key.chars().count() > 8 => {
            let head: String = key.chars().take(4).collect();
            format!("set ({head}***)")
        }
        Some(_) => "set (***)".to_string(),
        None => "missing".to_string(),
    }
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}
