//! Concurrent store of live watch sessions.
//!
//! [`SessionRegistry`] maps each [`SessionId`] to its [`WatchSession`]
//! behind a [`tokio::sync::RwLock`]. The connection layer inserts a session
//! when a socket is accepted and removes it when the socket closes; the
//! REST endpoints read from it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::session::WatchSession;
use crate::domain::{SessionId, SessionSummary};
use crate::error::WatchError;

/// Central store for all live sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<WatchSession>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session under its own ID.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::InvalidRequest`] if a session with the same
    /// ID is already registered (should never happen with UUID v4).
    pub async fn insert(&self, session: Arc<WatchSession>) -> Result<SessionId, WatchError> {
        let id = session.id();
        let mut map = self.sessions.write().await;
        if map.contains_key(&id) {
            return Err(WatchError::InvalidRequest(format!(
                "session {id} already registered"
            )));
        }
        map.insert(id, session);
        Ok(id)
    }

    /// Looks up a session.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::SessionNotFound`] if no session with the given
    /// ID is registered.
    pub async fn get(&self, id: SessionId) -> Result<Arc<WatchSession>, WatchError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(Arc::clone)
            .ok_or(WatchError::SessionNotFound(id))
    }

    /// Removes a session, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::SessionNotFound`] if no session with the given
    /// ID is registered.
    pub async fn remove(&self, id: SessionId) -> Result<Arc<WatchSession>, WatchError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .ok_or(WatchError::SessionNotFound(id))
    }

    /// Returns summaries of every registered session.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions: Vec<Arc<WatchSession>> =
            self.sessions.read().await.values().map(Arc::clone).collect();
        let mut summaries = Vec::with_capacity(sessions.len());
        for session in sessions {
            summaries.push(session.summary().await);
        }
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }

    /// Returns the number of registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is registered.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
