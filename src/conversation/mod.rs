//! Conversation loop
//!
//! Drives one [`ChatSession`] through its turns: append the user's message,
//! render, run the RAG pipeline, append the assistant's reply, render again.
//! Rendering goes through [`TranscriptView`], so the loop does not know
//! whether it is feeding a terminal, an SSE stream or a test recorder.

pub mod manager;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

pub use manager::SessionManager;
pub use session::ChatMessage;
pub use session::ChatSession;
pub use session::ConversationState;
pub use session::Role;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::RagChatError;
use crate::errors::Result;
use crate::rag::Answer;
use crate::rag::AnswerStream;
use crate::rag::Composition;
use crate::rag::RagService;

/// Assistant reply when looking up context failed
pub const LOOKUP_FAILED_NOTICE: &str =
    "Sorry, something went wrong while looking that up. Please try again.";

/// Assistant reply when the turn was cancelled
pub const CANCELLED_NOTICE: &str = "Request cancelled.";

/// Assistant reply when the turn ran out of time before an answer started
pub const TIMEOUT_NOTICE: &str = "Sorry, that took too long. Please try again.";

/// Receives the transcript whenever it changes
pub trait TranscriptView: Send {
    /// Show the full transcript
    fn render(&mut self, transcript: &[ChatMessage]);

    /// Show a chunk of the assistant reply that is still being generated
    fn partial(&mut self, _delta: &str) {}
}

/// Runs turns for any session against one shared [`RagService`]
pub struct ConversationLoop {
    rag: Arc<RagService>,
    turn_timeout: Duration,
    stream: bool,
}

impl ConversationLoop {
    pub fn new(rag: Arc<RagService>, turn_timeout: Duration, stream: bool) -> Self {
        Self {
            rag,
            turn_timeout,
            stream,
        }
    }

    pub fn from_config(rag: Arc<RagService>, config: &AppConfig) -> Self {
        Self::new(rag, config.turn_timeout(), config.llm.stream)
    }

    /// Run one turn
    ///
    /// Invalid or concurrent submissions are rejected before anything changes.
    /// Once the user's message is accepted an assistant message is always
    /// appended. Lookup failures, cancellation and timeouts during retrieval
    /// append a notice and are then returned as errors. Once generation has
    /// started, cancellation and the deadline yield the unavailable notice.
    pub async fn submit(
        &self,
        session: &mut ChatSession,
        text: &str,
        view: &mut dyn TranscriptView,
        cancel: &CancellationToken,
    ) -> Result<ChatMessage> {
        session.begin_turn(text)?;
        view.render(session.transcript());

        let deadline = Instant::now() + self.turn_timeout;
        let outcome = self.run_pipeline(text, view, cancel, deadline).await;

        let (reply, result) = match outcome {
            Ok(answer) => (answer.into_text(), Ok(())),
            Err(e) => {
                let notice = match &e {
                    RagChatError::Cancelled => CANCELLED_NOTICE,
                    RagChatError::Timeout(_) => TIMEOUT_NOTICE,
                    _ => LOOKUP_FAILED_NOTICE,
                };
                error!("Turn failed in session {}: {}", session.id(), e);
                (notice.to_string(), Err(e))
            }
        };

        let message = session.complete_turn(reply)?.clone();
        view.render(session.transcript());
        session.await_input();

        result.map(|()| message)
    }

    async fn run_pipeline(
        &self,
        question: &str,
        view: &mut dyn TranscriptView,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> Result<Answer> {
        let retrieval = tokio::time::timeout_at(deadline, self.rag.prepare(question));
        let (_, composition) = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RagChatError::Cancelled),
            result = retrieval => match result {
                Ok(result) => result?,
                Err(_) => return Err(RagChatError::Timeout(self.turn_timeout)),
            },
        };

        let prompt = match composition {
            Composition::Fallback => return Ok(Answer::NoContext),
            Composition::Prompt(prompt) => prompt,
        };

        let started = async {
            if self.stream {
                self.rag.generate_stream(&prompt).await
            } else {
                AnswerStream::Ready(self.rag.generate(&prompt).await)
            }
        };

        let answer_stream = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Answer generation cancelled");
                return Ok(Answer::Unavailable);
            }
            () = tokio::time::sleep_until(deadline) => {
                warn!("Answer generation exceeded {:?}", self.turn_timeout);
                return Ok(Answer::Unavailable);
            }
            answer_stream = started => answer_stream,
        };

        let mut stream = match answer_stream {
            AnswerStream::Ready(answer) => return Ok(answer),
            AnswerStream::Streaming(stream) => stream,
        };

        let mut text = String::new();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("Answer generation cancelled");
                    return Ok(Answer::Unavailable);
                }
                () = tokio::time::sleep_until(deadline) => {
                    warn!("Answer generation exceeded {:?}", self.turn_timeout);
                    return Ok(Answer::Unavailable);
                }
                chunk = stream.next_chunk() => match chunk {
                    Some(Ok(delta)) => {
                        view.partial(&delta);
                        text.push_str(&delta);
                    }
                    Some(Err(e)) => {
                        error!("Error streaming chat completion: {}", e);
                        return Ok(Answer::Unavailable);
                    }
                    None => break,
                },
            }
        }

        if text.trim().is_empty() {
            warn!("Chat completion streamed an empty answer");
            return Ok(Answer::Unavailable);
        }
        info!("Streamed answer of {} chars", text.len());
        Ok(Answer::Generated(text))
    }
}

/// View that discards everything
pub struct NullView;

impl TranscriptView for NullView {
    fn render(&mut self, _transcript: &[ChatMessage]) {}
}
