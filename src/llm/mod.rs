//! Chat-completion module
//!
//! The answer generator speaks to the Anthropic Messages API with a fixed persona,
//! temperature and output cap. Everything above this module only sees the
//! [`AnswerGenerator`] trait.

pub mod client;
pub mod persona;
pub mod streaming;

use async_trait::async_trait;
pub use client::AnthropicClient;
pub use persona::PERSONA_NAME;
pub use persona::PERSONA_PROMPT;
pub use streaming::StreamingResponse;

use crate::errors::Result;

/// Chat model used for every answer
pub const CHAT_MODEL: &str = "claude-3-7-sonnet-20250219";

/// Hard cap on generated tokens
pub const MAX_OUTPUT_TOKENS: usize = 300;

/// Sampling temperature
pub const TEMPERATURE: f32 = 0.6;

/// Produces an answer for a fully composed prompt
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate the whole answer in one response
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate the answer as a stream of text chunks
    ///
    /// The default yields the complete answer as a single chunk.
    async fn generate_stream(&self, prompt: &str) -> Result<StreamingResponse> {
        let text = self.generate(prompt).await?;
        Ok(StreamingResponse::from_text(text))
    }
}
