//! Recording fakes for the three provider seams

#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use personarag::embeddings::Embedder;
use personarag::embeddings::Embedding;
use personarag::llm::AnswerGenerator;
use personarag::llm::StreamingResponse;
use personarag::rag::ContextAssembler;
use personarag::rag::RagService;
use personarag::retrieval::RetrievedPassage;
use personarag::retrieval::VectorIndex;
use personarag::RagChatError;
use personarag::Result;

pub const DIMENSION: usize = 8;

#[derive(Default)]
pub struct FakeEmbedder {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RagChatError::external("embedding", "503 Service Unavailable"));
        }
        Ok(vec![0.1; DIMENSION])
    }
}

#[derive(Default)]
pub struct FakeIndex {
    pub passages: Vec<RetrievedPassage>,
    pub requested_top_k: Mutex<Vec<usize>>,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl FakeIndex {
    pub fn with_passages(passages: Vec<RetrievedPassage>) -> Self {
        Self {
            passages,
            ..Self::default()
        }
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn search(&self, _query_vector: &[f32], top_k: usize) -> Result<Vec<RetrievedPassage>> {
        self.requested_top_k.lock().unwrap().push(top_k);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RagChatError::external("vector search", "index unavailable"));
        }
        Ok(self.passages.clone())
    }
}

/// Generator that records every prompt it receives
#[derive(Default)]
pub struct FakeGenerator {
    pub prompts: Mutex<Vec<String>>,
    pub reply: String,
    pub fail: bool,
    /// Stream the reply in these chunks instead of one piece
    pub chunks: Option<Vec<Result<String>>>,
    /// Wait this long before answering
    pub delay: Option<Duration>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn streaming(chunks: Vec<Result<String>>) -> Self {
        Self {
            chunks: Some(chunks),
            ..Self::default()
        }
    }

    pub fn slow(reply: &str, delay: Duration) -> Self {
        Self {
            reply: reply.to_string(),
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AnswerGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RagChatError::Generation("upstream 529 overloaded".to_string()));
        }
        Ok(self.reply.clone())
    }

    async fn generate_stream(&self, prompt: &str) -> Result<StreamingResponse> {
        let Some(chunks) = &self.chunks else {
            let text = self.generate(prompt).await?;
            return Ok(StreamingResponse::from_text(text));
        };
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let chunks: Vec<Result<String>> = chunks
            .iter()
            .map(|chunk| match chunk {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(RagChatError::Generation(e.to_string())),
            })
            .collect();
        Ok(StreamingResponse::new(Box::pin(futures::stream::iter(
            chunks,
        ))))
    }
}

pub struct Fakes {
    pub embedder: Arc<FakeEmbedder>,
    pub index: Arc<FakeIndex>,
    pub generator: Arc<FakeGenerator>,
}

impl Fakes {
    pub fn new(index: FakeIndex, generator: FakeGenerator) -> Self {
        Self {
            embedder: Arc::new(FakeEmbedder::default()),
            index: Arc::new(index),
            generator: Arc::new(generator),
        }
    }

    pub fn service(&self, top_k: usize) -> RagService {
        RagService::from_services(
            self.embedder.clone(),
            self.index.clone(),
            self.generator.clone(),
            ContextAssembler::default(),
            top_k,
        )
    }
}

pub fn resume_passages() -> Vec<RetrievedPassage> {
    vec![
        RetrievedPassage::new(
            "resume-3",
            Some("resume.pdf"),
            Some("Designed a sharded event store replicated across three regions."),
            0.91,
        ),
        RetrievedPassage::new(
            "resume-7",
            Some("resume.pdf"),
            Some("Led the migration of batch jobs to a Kafka streaming pipeline."),
            0.85,
        ),
    ]
}
