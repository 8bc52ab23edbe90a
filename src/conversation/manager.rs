//! Session management with automatic cleanup

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::ChatSession;
use crate::errors::RagChatError;
use crate::errors::Result;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// In-memory registry of live sessions. Nothing survives a restart.
pub struct SessionManager {
    sessions: DashMap<String, Arc<Mutex<ChatSession>>>,
    active_turns: DashMap<String, CancellationToken>,
    session_timeout: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(session_timeout_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            active_turns: DashMap::new(),
            session_timeout: Duration::from_secs(session_timeout_secs),
        }
    }

    /// Create and start a session, returning its snapshot
    pub fn create_session(&self) -> ChatSession {
        let mut session = ChatSession::new();
        session.start();
        self.sessions
            .insert(session.id().to_string(), Arc::new(Mutex::new(session.clone())));
        info!("Created session {}", session.id());
        session
    }

    /// Copy of the session's current state
    pub async fn snapshot(&self, session_id: &str) -> Result<ChatSession> {
        let handle = self.handle(session_id)?;
        let session = handle.lock().await;
        Ok(session.clone())
    }

    /// Exclusive access for one turn; fails fast if a turn is already running
    pub fn acquire(&self, session_id: &str) -> Result<OwnedMutexGuard<ChatSession>> {
        self.handle(session_id)?
            .try_lock_owned()
            .map_err(|_| RagChatError::SessionBusy(session_id.to_string()))
    }

    /// Register the cancellation token of a turn that is about to run
    pub fn begin_turn(&self, session_id: &str) -> CancellationToken {
        let token = CancellationToken::new();
        self.active_turns
            .insert(session_id.to_string(), token.clone());
        token
    }

    pub fn end_turn(&self, session_id: &str) {
        self.active_turns.remove(session_id);
    }

    /// Cancel the running turn, if any. Returns whether one was running.
    pub fn cancel(&self, session_id: &str) -> Result<bool> {
        if !self.sessions.contains_key(session_id) {
            return Err(RagChatError::SessionNotFound(session_id.to_string()));
        }
        Ok(self
            .active_turns
            .get(session_id)
            .map(|token| token.cancel())
            .is_some())
    }

    /// End a session and discard its transcript
    pub fn delete_session(&self, session_id: &str) -> bool {
        if let Some((_, token)) = self.active_turns.remove(session_id) {
            token.cancel();
        }
        self.sessions.remove(session_id).is_some()
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions idle for longer than the timeout. Busy sessions are skipped.
    ///
    /// The busy check and the removal happen under the same map lock, so a
    /// session acquired for a turn is never removed under it.
    pub fn cleanup_expired_sessions(&self) -> usize {
        let timeout_secs = self.session_timeout.as_secs();
        let mut removed = 0;
        self.sessions.retain(|session_id, session| {
            let expired = session
                .try_lock()
                .map(|session| session.is_expired(timeout_secs))
                .unwrap_or(false);
            if expired {
                info!("Cleaned up expired session: {}", session_id);
                removed += 1;
            }
            !expired
        });
        removed
    }

    /// Start the periodic cleanup task
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                manager.cleanup_expired_sessions();
            }
        })
    }

    fn handle(&self, session_id: &str) -> Result<Arc<Mutex<ChatSession>>> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RagChatError::SessionNotFound(session_id.to_string()))
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(3600) // 1 hour timeout
    }
}
