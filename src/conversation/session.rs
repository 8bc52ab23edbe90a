//! Chat session: transcript plus the turn state machine

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::RagChatError;
use crate::errors::Result;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Chat message in the transcript. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

impl ChatMessage {
    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Where a session is in its turn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Idle,
    AwaitingInput,
    Processing,
    Rendered,
}

/// Chat session data
///
/// The transcript only grows, one user message followed by one assistant message per turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    session_id: String,
    state: ConversationState,
    messages: Vec<ChatMessage>,
    last_activity: i64,
}

impl ChatSession {
    #[must_use]
    pub fn new() -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            session_id: Uuid::new_v4().to_string(),
            state: ConversationState::Idle,
            messages: Vec::new(),
            last_activity: now,
        }
    }

    /// Idle -> AwaitingInput
    pub fn start(&mut self) {
        if self.state == ConversationState::Idle {
            self.state = ConversationState::AwaitingInput;
        }
    }

    /// AwaitingInput -> Processing, appending the user's message
    pub fn begin_turn(&mut self, content: &str) -> Result<&ChatMessage> {
        if content.trim().is_empty() {
            return Err(RagChatError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }
        match self.state {
            ConversationState::AwaitingInput => {}
            ConversationState::Idle => {
                return Err(RagChatError::InvalidInput(format!(
                    "session {} has not started",
                    self.session_id
                )))
            }
            ConversationState::Processing | ConversationState::Rendered => {
                return Err(RagChatError::SessionBusy(self.session_id.clone()))
            }
        }

        self.state = ConversationState::Processing;
        Ok(self.push(Role::User, content.to_string()))
    }

    /// Processing -> Rendered, appending the assistant's reply
    pub fn complete_turn(&mut self, content: String) -> Result<&ChatMessage> {
        if self.state != ConversationState::Processing {
            return Err(RagChatError::InvalidInput(format!(
                "session {} has no turn in progress",
                self.session_id
            )));
        }

        self.state = ConversationState::Rendered;
        Ok(self.push(Role::Assistant, content))
    }

    /// Rendered -> AwaitingInput
    pub fn await_input(&mut self) {
        if self.state == ConversationState::Rendered {
            self.state = ConversationState::AwaitingInput;
        }
    }

    fn push(&mut self, role: Role, content: String) -> &ChatMessage {
        let message = ChatMessage::new(role, content);
        self.last_activity = message.timestamp;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    pub const fn state(&self) -> ConversationState {
        self.state
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_expired(&self, timeout_secs: u64) -> bool {
        let idle = chrono::Utc::now().timestamp() - self.last_activity;
        idle > i64::try_from(timeout_secs).unwrap_or(i64::MAX)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
