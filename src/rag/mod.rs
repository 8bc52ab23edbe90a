//! RAG (Retrieval-Augmented Generation) module
//!
//! End-to-end question answering as the persona:
//! - Semantic retrieval of stored passages
//! - Context assembly under a character budget
//! - Prompt composition
//! - Answer generation, with failures mapped to a fixed notice
//!
//! # Examples
//!
//! ```rust,no_run
//! use personarag::config::AppConfig;
//! use personarag::config::Credentials;
//! use personarag::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load("config.toml")?;
//!     let credentials = Credentials::load(&config.secrets)?;
//!     let service = RagService::from_config(&config, &credentials)?;
//!
//!     let response = service.answer("What is your experience with distributed systems?").await?;
//!     println!("Answer: {}", response.answer.text());
//!     println!("Sources: {} passages", response.sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod prompts;

pub use context::ContextAssembler;
pub use pipeline::AnswerStream;
pub use pipeline::RagResponse;
pub use pipeline::RagService;
pub use prompts::compose;
pub use prompts::Composition;

/// Reply used when retrieval finds nothing; the generator is not called
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information.";

/// Reply used when the chat-completion call fails
pub const GENERATION_UNAVAILABLE: &str =
    "Sorry, I couldn't come up with an answer just now. Please try again.";

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Text produced by the chat model
    Generated(String),
    /// Retrieval returned no passages
    NoContext,
    /// The chat model failed; the failure has been logged
    Unavailable,
}

impl Answer {
    /// Text to show in the transcript
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::NoContext => NO_CONTEXT_ANSWER,
            Self::Unavailable => GENERATION_UNAVAILABLE,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) => text,
            other => other.text().to_string(),
        }
    }

    pub const fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}
