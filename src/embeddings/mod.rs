//! Embeddings generation module
//!
//! Turns a question into a fixed-length vector through the OpenAI embeddings API.
//! The pipeline only depends on the [`Embedder`] trait, so tests and alternative
//! providers can stand in for [`EmbeddingClient`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use personarag::config::AppConfig;
//! use personarag::config::Credentials;
//! use personarag::embeddings::Embedder;
//! use personarag::embeddings::EmbeddingClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load("config.toml")?;
//!     let credentials = Credentials::load(&config.secrets)?;
//!     let client = EmbeddingClient::from_config(&config, &credentials)?;
//!
//!     let embedding = client.embed("Hello, world!").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;

use async_trait::async_trait;
pub use client::EmbeddingClient;

use crate::errors::Result;

/// Default embedding dimension for OpenAI text-embedding-ada-002
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// The single embedding model used for both indexing and querying
pub const EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// A vector embedding
pub type Embedding = Vec<f32>;

/// Converts text into a vector of fixed dimensionality
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text. No retries are attempted.
    async fn embed(&self, text: &str) -> Result<Embedding>;
}
