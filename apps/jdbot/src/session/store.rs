use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::session::models::ConversationState;

const DEFAULT_IDLE_MINUTES: i64 = 60;

/// In-memory session registry. Sessions vanish on restart.
///
/// Each session sits behind its own mutex, so turns within a session are
/// serialized while separate sessions never contend.
///
/// Sessions with no turn for longer than the idle timeout are dropped the next
/// time a session is created. A session whose turn is in flight is never dropped.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<ConversationState>>>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(Duration::minutes(DEFAULT_IDLE_MINUTES))
    }
}

impl SessionStore {
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Opens a new session and returns its id with a snapshot of the initial state.
    pub async fn create(&self) -> (Uuid, ConversationState) {
        self.evict_idle().await;

        let id = Uuid::new_v4();
        let state = ConversationState::new();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(state.clone())));
        (id, state)
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<ConversationState>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Ends a session. Returns false if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions idle past the timeout. Returns how many were removed.
    pub async fn evict_idle(&self) -> usize {
        let cutoff = Utc::now() - self.idle_timeout;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        // a locked session is mid-turn
        sessions.retain(|_, session| match session.try_lock() {
            Ok(state) => !state.idle_since(cutoff),
            Err(_) => true,
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }
}
