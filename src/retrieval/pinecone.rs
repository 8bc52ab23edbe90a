//! Pinecone vector index client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::info;

use super::RetrievedPassage;
use super::VectorIndex;
use super::INDEX_NAME;
use crate::config::AppConfig;
use crate::config::Credentials;
use crate::errors::RagChatError;
use crate::errors::Result;

const PROVIDER: &str = "pinecone";
const SERVICE: &str = "vector search";
const API_VERSION: &str = "2024-07";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl From<QueryMatch> for RetrievedPassage {
    fn from(m: QueryMatch) -> Self {
        let field = |name: &str| {
            m.metadata
                .as_ref()
                .and_then(|meta| meta.get(name))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };

        Self {
            source_id: field("source"),
            text: field("text"),
            id: m.id,
            score: m.score,
        }
    }
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

/// Client for a single Pinecone index
///
/// The data-plane host is looked up once through the control plane on first use,
/// unless one was configured explicitly.
pub struct PineconeIndex {
    index_name: String,
    controller_endpoint: String,
    api_key: Option<String>,
    host: OnceCell<String>,
    client: Client,
}

impl PineconeIndex {
    pub fn new(
        controller_endpoint: impl Into<String>,
        index_host: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagChatError::Http(e.to_string()))?;

        let host = match index_host {
            Some(host) => OnceCell::new_with(Some(normalize_host(&host))),
            None => OnceCell::new(),
        };

        Ok(Self {
            index_name: INDEX_NAME.to_string(),
            controller_endpoint: controller_endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            host,
            client,
        })
    }

    pub fn from_config(config: &AppConfig, credentials: &Credentials) -> Result<Self> {
        Self::new(
            config.retrieval.controller_endpoint.clone(),
            config.retrieval.index_host.clone(),
            credentials.pinecone_api_key.clone(),
            config.request_timeout(),
        )
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            RagChatError::authentication(PROVIDER, "PINECONE_API_KEY is not configured")
        })
    }

    async fn host(&self) -> Result<&str> {
        self.host
            .get_or_try_init(|| self.describe_host())
            .await
            .map(String::as_str)
    }

    async fn describe_host(&self) -> Result<String> {
        let url = format!("{}/indexes/{}", self.controller_endpoint, self.index_name);
        debug!("Resolving Pinecone index host: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Api-Key", self.api_key()?)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| RagChatError::external(SERVICE, e.to_string()))?;

        let response = check_status(response).await?;
        let described: DescribeIndexResponse = response
            .json()
            .await
            .map_err(|e| {
                RagChatError::external(SERVICE, format!("Failed to parse index description: {e}"))
            })?;

        let host = normalize_host(&described.host);
        info!("Resolved index '{}' to {}", self.index_name, host);
        Ok(host)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<RetrievedPassage>> {
        let api_key = self.api_key()?;
        let url = format!("{}/query", self.host().await?);
        debug!("Querying Pinecone: {} (top_k={})", url, top_k);

        let request = QueryRequest {
            vector: query_vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagChatError::external(SERVICE, e.to_string()))?;

        let response = check_status(response).await?;
        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| {
                RagChatError::external(SERVICE, format!("Failed to parse response: {e}"))
            })?;

        Ok(result.matches.into_iter().map(RetrievedPassage::from).collect())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
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
    Err(RagChatError::external(
        SERVICE,
        format!("Pinecone API error ({status}): {error_text}"),
    ))
}

/// Index descriptions report a bare hostname
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::body_partial_json;
    use wiremock::matchers::header;
    use wiremock::matchers::method;
    use wiremock::matchers::path;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;

    use super::*;

    fn matches_body() -> serde_json::Value {
        serde_json::json!({
            "matches": [
                { "id": "a", "score": 0.91, "metadata": { "source": "resume.pdf", "text": "Built a scheduler" } },
                { "id": "b", "score": 0.85, "metadata": { "text": "Designed a cache" } },
                { "id": "c", "score": 0.42 }
            ]
        })
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("idx.svc.pinecone.io"), "https://idx.svc.pinecone.io");
        assert_eq!(normalize_host("http://localhost:1234/"), "http://localhost:1234");
    }

    #[tokio::test]
    async fn test_query_with_explicit_host() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header("api-key", "pc-key"))
            .and(body_partial_json(serde_json::json!({
                "topK": 3,
                "includeMetadata": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(matches_body()))
            .expect(1)
            .mount(&server)
            .await;

        let index = PineconeIndex::new(
            "http://unused.invalid",
            Some(server.uri()),
            Some("pc-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let passages = index.search(&[0.1, 0.2], 3).await.unwrap();
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].source_id.as_deref(), Some("resume.pdf"));
        assert_eq!(passages[0].text.as_deref(), Some("Built a scheduler"));
        assert!((passages[0].score - 0.91).abs() < f32::EPSILON);
        assert_eq!(passages[1].source_id, None);
        assert_eq!(passages[2].text, None);
    }

    #[tokio::test]
    async fn test_host_is_resolved_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/domrag2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "host": server.uri() })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "matches": [] })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let index = PineconeIndex::new(
            server.uri(),
            None,
            Some("pc-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(index.search(&[0.1], 5).await.unwrap().is_empty());
        assert!(index.search(&[0.2], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_authentication_error() {
        let index = PineconeIndex::new(
            "http://unused.invalid",
            Some("http://unused.invalid".to_string()),
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        let result = index.search(&[0.1], 5).await;
        assert!(matches!(
            result,
            Err(RagChatError::Authentication { provider: "pinecone", .. })
        ));
    }

    #[tokio::test]
    async fn test_forbidden_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let index = PineconeIndex::new(
            server.uri(),
            Some(server.uri()),
            Some("bad".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let result = index.search(&[0.1], 5).await;
        assert!(matches!(result, Err(RagChatError::Authentication { .. })));
    }

    #[tokio::test]
    async fn test_server_error_is_external_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let index = PineconeIndex::new(
            server.uri(),
            Some(server.uri()),
            Some("pc".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let result = index.search(&[0.1], 5).await;
        assert!(matches!(result, Err(RagChatError::ExternalService { .. })));
    }
}
