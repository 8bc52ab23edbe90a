//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - ask: One-shot questions
//! - chat: Interactive terminal conversation
//! - serve: Web chat server
//! - info: Information display (config)

pub mod ask;
pub mod chat;
pub mod info;
pub mod serve;

use std::sync::Arc;

// Re-export all public handlers
pub use ask::*;
pub use chat::*;
pub use info::*;
pub use serve::*;

use crate::config::Credentials;
use crate::rag::RagService;
use crate::AppConfig;
use crate::Result;

/// Load credentials and build the RAG service shared by every command
pub fn build_rag_service(config: &AppConfig) -> Result<Arc<RagService>> {
    let credentials = Credentials::load(&config.secrets)?;
    Ok(Arc::new(RagService::from_config(config, &credentials)?))
}
