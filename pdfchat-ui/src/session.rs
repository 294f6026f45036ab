use std::{collections::HashMap, sync::Arc, time::Duration};

use pdfchat_rag::ChatSession;
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use tracing::debug;
use uuid::Uuid;

use crate::protocol::SessionId;

/// How long a session may go untouched before it is dropped.
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// Shared handle to one user's chat state.
///
/// Holding the lock serializes that user's events: a question waits for an
/// in-flight processing run and vice versa.
pub type SessionHandle = Arc<Mutex<ChatSession>>;

#[derive(Debug)]
struct SessionEntry {
    handle: SessionHandle,
    last_access: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self { handle: Arc::new(Mutex::new(ChatSession::new())), last_access: Instant::now() }
    }

    /// Idle for at least `ttl` and not held by any in-flight request.
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_access) >= ttl && Arc::strong_count(&self.handle) == 1
    }
}

/// Per-user chat state keyed by session id.
///
/// Sessions only come into being through [`SessionManager::create_session`]
/// or [`SessionManager::ensure_session`]. Lookups refresh a session's
/// last-access time; sessions idle for longer than the configured TTL are
/// swept whenever a new one is created.
#[derive(Debug, Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    idle_ttl: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_SESSION_IDLE_TTL)
    }
}

impl SessionManager {
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self { sessions: Arc::default(), idle_ttl }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub async fn create_session(&self) -> SessionId {
        let session_id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions);
        sessions.insert(session_id.clone(), SessionEntry::new());
        debug!(session_id = %session_id, "created session");
        session_id
    }

    /// Return the session for `session_id`, creating an idle one if needed.
    pub async fn ensure_session(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.get(session_id).await {
            return handle;
        }
        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions);
        let entry = sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id, "created session on demand");
            SessionEntry::new()
        });
        entry.last_access = Instant::now();
        entry.handle.clone()
    }

    /// Look up an existing session and mark it as recently used.
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(session_id)?;
        entry.last_access = Instant::now();
        Some(entry.handle.clone())
    }

    pub async fn has_session(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(session_id)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every expired session now. Returns how many were removed.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions)
    }

    fn sweep(&self, sessions: &mut HashMap<SessionId, SessionEntry>) -> usize {
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|session_id, entry| {
            let expired = entry.is_expired(now, self.idle_ttl);
            if expired {
                debug!(session_id = %session_id, "evicted idle session");
            }
            !expired
        });
        before - sessions.len()
    }
}
