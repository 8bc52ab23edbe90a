//! Complete RAG pipeline: Embed -> Retrieve -> Compose -> Generate

use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::compose;
use super::Answer;
use super::Composition;
use super::ContextAssembler;
use crate::config::AppConfig;
use crate::config::Credentials;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingClient;
use crate::errors::Result;
use crate::llm::AnswerGenerator;
use crate::llm::AnthropicClient;
use crate::llm::StreamingResponse;
use crate::retrieval::PineconeIndex;
use crate::retrieval::RetrievedPassage;
use crate::retrieval::Retriever;
use crate::retrieval::VectorIndex;

/// Complete RAG service
///
/// Embedding and retrieval failures are returned to the caller. Generation
/// failures are logged and become [`Answer::Unavailable`].
pub struct RagService {
    retriever: Retriever,
    context_assembler: ContextAssembler,
    generator: Arc<dyn AnswerGenerator>,
    top_k: usize,
}

impl RagService {
    /// Build the service with the production provider clients
    ///
    /// # Errors
    /// - HTTP client build errors
    pub fn from_config(config: &AppConfig, credentials: &Credentials) -> Result<Self> {
        let missing = credentials.missing();
        if !missing.is_empty() {
            warn!(
                "Missing credentials: {} (calls to those providers will fail)",
                missing.join(", ")
            );
        }

        let embedder = Arc::new(EmbeddingClient::from_config(config, credentials)?);
        let index = Arc::new(PineconeIndex::from_config(config, credentials)?);
        let generator = Arc::new(AnthropicClient::from_config(config, credentials)?);

        Ok(Self::from_services(
            embedder,
            index,
            generator,
            ContextAssembler::from_config(&config.context),
            config.top_k(),
        ))
    }

    /// Create from existing services
    #[must_use]
    pub fn from_services(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn AnswerGenerator>,
        context_assembler: ContextAssembler,
        top_k: usize,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedder, index),
            context_assembler,
            generator,
            top_k,
        }
    }

    /// Answer a question in one response
    ///
    /// # Errors
    /// - Embedding errors (authentication, provider failures)
    /// - Retrieval errors (authentication, provider failures)
    pub async fn answer(&self, question: &str) -> Result<RagResponse> {
        info!("Processing RAG query: {}", question);
        let (sources, composition) = self.prepare(question).await?;

        let answer = match &composition {
            Composition::Fallback => Answer::NoContext,
            Composition::Prompt(prompt) => self.generate(prompt).await,
        };

        info!("RAG query completed: {:?}", AnswerKind::from(&answer));
        Ok(RagResponse {
            answer,
            sources,
            prompt: match composition {
                Composition::Prompt(prompt) => Some(prompt),
                Composition::Fallback => None,
            },
        })
    }

    /// Answer a question as a stream of text chunks
    ///
    /// Failures that happen after streaming started are reported by the stream itself.
    pub async fn answer_stream(&self, question: &str) -> Result<AnswerStream> {
        info!("Processing streaming RAG query: {}", question);
        let (_, composition) = self.prepare(question).await?;

        let Composition::Prompt(prompt) = composition else {
            return Ok(AnswerStream::Ready(Answer::NoContext));
        };

        Ok(self.generate_stream(&prompt).await)
    }

    /// Generate the answer for a composed prompt
    ///
    /// Failures are logged and become [`Answer::Unavailable`].
    pub async fn generate(&self, prompt: &str) -> Answer {
        debug!("Step 3: Generating answer");
        match self.generator.generate(prompt).await {
            Ok(text) => Answer::Generated(text),
            Err(e) => {
                error!("Error calling chat completion API: {}", e);
                Answer::Unavailable
            }
        }
    }

    /// Start a streamed answer for a composed prompt
    ///
    /// A failure before the first chunk becomes [`Answer::Unavailable`].
    pub async fn generate_stream(&self, prompt: &str) -> AnswerStream {
        debug!("Step 3: Generating answer (streaming)");
        match self.generator.generate_stream(prompt).await {
            Ok(stream) => AnswerStream::Streaming(stream),
            Err(e) => {
                error!("Error calling chat completion API: {}", e);
                AnswerStream::Ready(Answer::Unavailable)
            }
        }
    }

    /// Retrieve passages without generating an answer
    pub async fn search(&self, question: &str) -> Result<Vec<RetrievedPassage>> {
        self.retriever.retrieve(question, self.top_k).await
    }

    /// Retrieve passages, fit them into the context budget and compose the prompt
    ///
    /// # Errors
    /// - Embedding and retrieval errors
    pub async fn prepare(&self, question: &str) -> Result<(Vec<RetrievedPassage>, Composition)> {
        debug!("Step 1: Retrieving passages");
        let passages = self.search(question).await?;

        debug!("Step 2: Composing prompt from {} passages", passages.len());
        let sources = self.context_assembler.fit(&passages);
        let composition = compose(question, &sources);
        Ok((sources, composition))
    }
}

/// Answer that is either complete or still arriving
pub enum AnswerStream {
    Ready(Answer),
    Streaming(StreamingResponse),
}

#[derive(Debug)]
enum AnswerKind {
    Generated,
    NoContext,
    Unavailable,
}

impl From<&Answer> for AnswerKind {
    fn from(answer: &Answer) -> Self {
        match answer {
            Answer::Generated(_) => Self::Generated,
            Answer::NoContext => Self::NoContext,
            Answer::Unavailable => Self::Unavailable,
        }
    }
}

/// RAG response
#[derive(Debug, Clone)]
pub struct RagResponse {
    pub answer: Answer,
    pub sources: Vec<RetrievedPassage>,
    /// Prompt sent to the generator, if one was sent
    pub prompt: Option<String>,
}
