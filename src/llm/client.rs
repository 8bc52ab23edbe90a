//! Anthropic Messages API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::AnswerGenerator;
use super::StreamingResponse;
use super::CHAT_MODEL;
use super::MAX_OUTPUT_TOKENS;
use super::PERSONA_PROMPT;
use super::TEMPERATURE;
use crate::config::AppConfig;
use crate::config::Credentials;
use crate::errors::RagChatError;
use crate::errors::Result;

const PROVIDER: &str = "anthropic";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Chat-completion client answering as the fixed persona
pub struct AnthropicClient {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl AnthropicClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagChatError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub fn from_config(config: &AppConfig, credentials: &Credentials) -> Result<Self> {
        Self::new(
            config.llm.endpoint.clone(),
            credentials.anthropic_api_key.clone(),
            config.request_timeout(),
        )
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            RagChatError::authentication(PROVIDER, "ANTHROPIC_API_KEY is not configured")
        })?;

        let url = format!("{}/v1/messages", self.endpoint);
        debug!(
            "Calling Anthropic messages API: {} (stream={}, prompt {} chars)",
            url,
            stream,
            prompt.len()
        );

        let request = MessagesRequest {
            model: CHAT_MODEL,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            system: PERSONA_PROMPT,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
            stream,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(RagChatError::authentication(PROVIDER, error_text));
        }
        Err(RagChatError::Generation(format!(
            "Anthropic API error ({status}): {error_text}"
        )))
    }
}

#[async_trait]
impl AnswerGenerator for AnthropicClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.send(prompt, false).await?;
        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| RagChatError::Generation(format!("Failed to parse response: {e}")))?;

        result
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| RagChatError::Generation("No text content in response".to_string()))
    }

    async fn generate_stream(&self, prompt: &str) -> Result<StreamingResponse> {
        let response = self.send(prompt, true).await?;
        Ok(StreamingResponse::from_sse(response.bytes_stream()))
    }
}
