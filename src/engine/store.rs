//! In-memory session store keyed by the caller-supplied session id.
//!
//! The registry itself is a concurrent map; each session additionally sits
//! behind its own async mutex so turns for the same session serialize while
//! different sessions proceed in parallel. Nothing here is global — the
//! store is constructed explicitly and handed to the orchestrator.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::session::Session;
use super::stage::Stage;

/// Shared handle to one session's state.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Process-wide mapping from session id to session state.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionHandle>,
}

/// Read-only listing entry for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub stage: Stage,
    pub turn_count: u32,
    pub has_intel: bool,
    pub detected_language: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for a session, creating a fresh one for an unseen id.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session = session_id, "creating session");
                Arc::new(Mutex::new(Session::new(session_id)))
            })
            .clone()
    }

    /// Handle for an existing session, if any.
    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.get(session_id).map(|e| e.value().clone())
    }

    /// Delete a session's state. Idempotent: returns false (not an error)
    /// when the session does not exist.
    pub fn reset(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            tracing::info!(session = session_id, "session reset");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot listing of all sessions.
    pub async fn summaries(&self) -> Vec<SessionSummary> {
        // Clone handles first so no map shard lock is held across an await.
        let handles: Vec<SessionHandle> = self
            .sessions
            .iter()
            .map(|e| e.value().clone())
            .collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let session = handle.lock().await;
            summaries.push(SessionSummary {
                session_id: session.session_id.clone(),
                stage: session.stage,
                turn_count: session.turn_count,
                has_intel: session.has_intel(),
                detected_language: session.detected_language.clone(),
                created_at: session.created_at,
                last_active: session.last_active,
            });
        }
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_or_create_reuses_existing_session() {
        let store = SessionStore::new();
        let first = store.get_or_create("s1");
        first.lock().await.turn_count = 5;
        let again = store.get_or_create("s1");
        assert_eq!(again.lock().await.turn_count, 5);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let store = SessionStore::new();
        store.get_or_create("s1");
        assert!(store.reset("s1"));
        assert!(!store.reset("s1"));
        assert!(!store.reset("never-seen"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn reset_then_recreate_starts_fresh() {
        let store = SessionStore::new();
        store.get_or_create("s1").lock().await.turn_count = 9;
        store.reset("s1");
        let fresh = store.get_or_create("s1");
        assert_eq!(fresh.lock().await.turn_count, 0);
    }

    #[tokio::test]
    async fn summaries_cover_all_sessions() {
        let store = SessionStore::new();
        store.get_or_create("a");
        store.get_or_create("b");
        let summaries = store.summaries().await;
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| !s.has_intel));
    }

    #[tokio::test]
    async fn distinct_sessions_do_not_contend() {
        let store = Arc::new(SessionStore::new());
        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let id = format!("s{i}");
                let handle = store.get_or_create(&id);
                let mut session = handle.lock().await;
                session.turn_count += 1;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(store.len(), 8);
    }
}
