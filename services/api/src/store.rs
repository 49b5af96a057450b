//! In-Memory Session Store
//!
//! Sessions live for one user session and die with the process; nothing is
//! persisted. Each entry sits behind its own async mutex, so a session has
//! exactly one logical writer at a time and generation calls for the same
//! session never overlap. Sessions are fully isolated from each other.

use chrono::{DateTime, Utc};
use pathways_core::session::SessionState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// One stored session: identity, creation time, and the stage-machine state.
#[derive(Debug)]
pub struct SessionEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: SessionState,
}

/// A lightweight listing of a session, cheap to produce for the index
/// endpoint.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: Uuid,
    pub topic: String,
    pub created_at: DateTime<Utc>,
}

/// The shared, clonable session registry.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<SessionEntry>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session and returns its ID and entry handle.
    pub async fn insert(&self, state: SessionState) -> (Uuid, Arc<Mutex<SessionEntry>>) {
        let id = Uuid::new_v4();
        let entry = Arc::new(Mutex::new(SessionEntry {
            id,
            created_at: Utc::now(),
            state,
        }));
        self.inner.write().await.insert(id, Arc::clone(&entry));
        (id, entry)
    }

    /// Looks up a session entry by ID.
    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<SessionEntry>>> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Lists all sessions, most recent first.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let entries: Vec<Arc<Mutex<SessionEntry>>> =
            self.inner.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.lock().await;
            summaries.push(SessionSummary {
                id: entry.id,
                topic: entry.state.topic().to_string(),
                created_at: entry.created_at,
            });
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Ends a session, dropping all of its state. Returns false when the ID
    /// was unknown.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }
}
