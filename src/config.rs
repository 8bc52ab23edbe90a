use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

/// Environment / secrets key for the embedding provider
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment / secrets key for the chat-completion provider
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
/// Environment / secrets key for the vector index
pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            enable_cors: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub endpoint: String,
    pub dimension: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            dimension: crate::embeddings::DEFAULT_EMBEDDING_DIM,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Control-plane endpoint used to resolve the index host
    pub controller_endpoint: String,
    /// Skip host resolution and query this data-plane host directly
    pub index_host: Option<String>,
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            controller_endpoint: "https://api.pinecone.io".to_string(),
            index_host: None,
            top_k: crate::retrieval::DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    /// Stream answers token by token where the caller supports it
    pub stream: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com".to_string(),
            stream: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub max_context_chars: usize,
    pub min_chunk_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_chars: 8000,
            min_chunk_chars: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub turn_timeout_secs: u64,
    pub session_timeout_secs: u64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: 90,
            session_timeout_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// TOML file holding API keys as top-level string entries
    pub path: String,
    /// Load a local `.env` before falling back to the process environment
    pub load_dotenv: bool,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            path: "secrets.toml".to_string(),
            load_dotenv: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub embeddings: EmbeddingsConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    pub context: ContextConfig,
    pub conversation: ConversationConfig,
    pub secrets: SecretsConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, falling back to built-in defaults when it does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Reject values that would only fail later at first use
    pub fn validate(&self) -> crate::Result<()> {
        for (name, endpoint) in [
            ("embeddings.endpoint", &self.embeddings.endpoint),
            ("retrieval.controller_endpoint", &self.retrieval.controller_endpoint),
            ("llm.endpoint", &self.llm.endpoint),
        ] {
            url::Url::parse(endpoint)
                .map_err(|e| crate::RagChatError::Config(format!("{name}: {e}")))?;
        }
        if let Some(host) = &self.retrieval.index_host {
            url::Url::parse(host)
                .map_err(|e| crate::RagChatError::Config(format!("retrieval.index_host: {e}")))?;
        }
        if self.retrieval.top_k == 0 {
            return Err(crate::RagChatError::Config(
                "retrieval.top_k must be positive".to_string(),
            ));
        }
        if self.embeddings.dimension == 0 {
            return Err(crate::RagChatError::Config(
                "embeddings.dimension must be positive".to_string(),
            ));
        }
        if self.context.max_context_chars == 0 {
            return Err(crate::RagChatError::Config(
                "context.max_context_chars must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Get the outbound request timeout
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http.request_timeout_secs)
    }

    /// Get the per-turn deadline
    pub fn turn_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.conversation.turn_timeout_secs)
    }

    /// Get the retrieval depth
    pub fn top_k(&self) -> usize {
        self.retrieval.top_k
    }
}

/// API keys for the three providers. Any of them may be absent.
#[derive(Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub pinecone_api_key: Option<String>,
}

impl Credentials {
    /// Load keys from the secrets file, falling back per key to the environment
    pub fn load(secrets: &SecretsConfig) -> crate::Result<Self> {
        let path = Path::new(&secrets.path);
        let table = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Some(content.parse::<toml::Table>()?)
        } else {
            None
        };

        let credentials = Self::from_sources(table.as_ref(), |_| None);
        if credentials.is_complete() {
            return Ok(credentials);
        }

        if secrets.load_dotenv {
            if let Ok(env_path) = dotenvy::dotenv() {
                debug!("Loaded environment from {}", env_path.display());
            }
        }

        Ok(Self::from_sources(table.as_ref(), |key| {
            std::env::var(key).ok()
        }))
    }

    /// Resolve each key from `secrets` first, then `env`
    pub fn from_sources<F>(secrets: Option<&toml::Table>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            secrets
                .and_then(|table| table.get(key))
                .and_then(toml::Value::as_str)
                .map(str::to_string)
                .or_else(|| env(key))
                .filter(|value| !value.trim().is_empty())
        };

        Self {
            openai_api_key: lookup(OPENAI_API_KEY),
            anthropic_api_key: lookup(ANTHROPIC_API_KEY),
            pinecone_api_key: lookup(PINECONE_API_KEY),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.openai_api_key.is_some()
            && self.anthropic_api_key.is_some()
            && self.pinecone_api_key.is_some()
    }

    /// Names of keys that are not set
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openai_api_key.is_none() {
            missing.push(OPENAI_API_KEY);
        }
        if self.anthropic_api_key.is_none() {
            missing.push(ANTHROPIC_API_KEY);
        }
        if self.pinecone_api_key.is_none() {
            missing.push(PINECONE_API_KEY);
        }
        missing
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| if value.is_some() { "<set>" } else { "<missing>" };
        f.debug_struct("Credentials")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("pinecone_api_key", &redact(&self.pinecone_api_key))
            .finish()
    }
}
