//! OpenAI embeddings API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::Embedder;
use super::Embedding;
use super::EMBEDDING_MODEL;
use crate::config::AppConfig;
use crate::config::Credentials;
use crate::errors::RagChatError;
use crate::errors::Result;

const PROVIDER: &str = "openai";
const SERVICE: &str = "embedding";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for the OpenAI `/embeddings` endpoint
pub struct EmbeddingClient {
    endpoint: String,
    api_key: Option<String>,
    dimension: usize,
    client: Client,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// A missing `api_key` is not an error here; the first call fails with
    /// [`RagChatError::Authentication`] instead.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagChatError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            dimension,
            client,
        })
    }

    pub fn from_config(config: &AppConfig, credentials: &Credentials) -> Result<Self> {
        Self::new(
            config.embeddings.endpoint.clone(),
            credentials.openai_api_key.clone(),
            config.embeddings.dimension,
            config.request_timeout(),
        )
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            RagChatError::authentication(PROVIDER, "OPENAI_API_KEY is not configured")
        })?;

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI embeddings API: {} ({} chars)", url, text.len());

        let request = EmbeddingRequest {
            input: text,
            model: EMBEDDING_MODEL,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagChatError::external(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                return Err(RagChatError::authentication(PROVIDER, error_text));
            }
            return Err(RagChatError::external(
                SERVICE,
                format!("OpenAI API error ({status}): {error_text}"),
            ));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| {
                RagChatError::external(SERVICE, format!("Failed to parse response: {e}"))
            })?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RagChatError::external(SERVICE, "No embedding in response"))?;

        if embedding.len() != self.dimension {
            return Err(RagChatError::external(
                SERVICE,
                format!(
                    "expected {} dimensions, got {}",
                    self.dimension,
                    embedding.len()
                ),
            ));
        }

        Ok(embedding)
    }
}
