//! Retrieval-augmented persona chat
//!
//! A question is embedded, the nearest passages are fetched from the vector
//! index, and the passages plus the question are sent to the chat model,
//! which answers in the persona's voice. Turns are kept per session and
//! served through a web chat page or the terminal.

pub mod api;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod retrieval;


pub use config::AppConfig;
pub use errors::*;
