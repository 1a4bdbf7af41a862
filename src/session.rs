//! Conversation session store.
//!
//! Sessions hold ordered conversation turns keyed by an opaque identifier.
//! Appends to one session serialize through that session's mutex; unrelated
//! sessions proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::document::{Role, Turn};
use crate::error::{FixragError, Result};

#[derive(Debug)]
struct SessionState {
    turns: Mutex<Vec<Turn>>,
    created_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl SessionState {
    fn new() -> Self {
        let now = Utc::now();
        Self { turns: Mutex::new(Vec::new()), created_at: now, last_activity: RwLock::new(now) }
    }
}

/// In-memory store of per-session conversation history.
///
/// Turn order within a session is the append order; nothing reorders or
/// deduplicates. Idle-timeout eviction is an external policy layered on
/// [`last_activity`](SessionStore::last_activity).
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionState>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a generated identifier.
    pub async fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::new(SessionState::new()));
        session_id
    }

    /// Register a caller-supplied identifier. No-op if it already exists.
    pub async fn ensure_session(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(session_id) {
            sessions.insert(session_id.to_string(), Arc::new(SessionState::new()));
        }
    }

    /// Whether the identifier names a live session.
    pub async fn has_session(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    async fn state(&self, session_id: &str) -> Result<Arc<SessionState>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| FixragError::SessionNotFound(session_id.to_string()))
    }

    /// Append one turn.
    ///
    /// # Errors
    ///
    /// Returns [`FixragError::SessionNotFound`] for an unknown identifier.
    pub async fn append_turn(
        &self,
        session_id: &str,
        role: Role,
        text: impl Into<String> + Send,
    ) -> Result<()> {
        let state = self.state(session_id).await?;
        let mut turns = state.turns.lock().await;
        turns.push(Turn::new(role, text));
        *state.last_activity.write().await = Utc::now();
        Ok(())
    }

    /// Append a question/answer pair as one unit.
    ///
    /// Both turns land adjacently under a single hold of the session's
    /// mutex, so concurrent exchanges never interleave and cancellation
    /// cannot leave a half-appended pair.
    pub async fn append_exchange(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<()> {
        let state = self.state(session_id).await?;
        let mut turns = state.turns.lock().await;
        turns.push(Turn::new(Role::User, question));
        turns.push(Turn::new(Role::Assistant, answer));
        *state.last_activity.write().await = Utc::now();
        Ok(())
    }

    /// Return turns in append order, most-recent-last.
    ///
    /// With `max_turns`, the oldest turns are truncated first.
    ///
    /// # Errors
    ///
    /// Returns [`FixragError::SessionNotFound`] for an unknown identifier.
    pub async fn get_history(
        &self,
        session_id: &str,
        max_turns: Option<usize>,
    ) -> Result<Vec<Turn>> {
        let state = self.state(session_id).await?;
        let turns = state.turns.lock().await;
        let skip = max_turns.map_or(0, |max| turns.len().saturating_sub(max));
        Ok(turns[skip..].to_vec())
    }

    /// Delete a session. Idempotent: no error if already absent.
    pub async fn delete_session(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions exist.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// When the session was created.
    pub async fn created_at(&self, session_id: &str) -> Result<DateTime<Utc>> {
        Ok(self.state(session_id).await?.created_at)
    }

    /// When the session last had a turn appended.
    ///
    /// External idle-eviction policies key off this.
    pub async fn last_activity(&self, session_id: &str) -> Result<DateTime<Utc>> {
        let state = self.state(session_id).await?;
        let at = *state.last_activity.read().await;
        Ok(at)
    }
}
