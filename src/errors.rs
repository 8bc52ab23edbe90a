use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagChatError {
    #[error("Authentication failed for {provider}: {message}")]
    Authentication {
        provider: &'static str,
        message: String,
    },

    #[error("{service} service error: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {0} is already processing a message")]
    SessionBusy(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagChatError {
    pub fn authentication(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Authentication {
            provider,
            message: message.into(),
        }
    }

    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service,
            message: message.into(),
        }
    }

    /// Errors raised by an upstream provider (as opposed to local misuse)
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::ExternalService { .. } | Self::Http(_)
        )
    }
}

impl From<reqwest::Error> for RagChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Http(format!("request timed out: {err}"))
        } else {
            Self::Http(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, RagChatError>;
