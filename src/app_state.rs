//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::WatchConfig;
use crate::upstream::ResourceSource;
use crate::watch::SessionRegistry;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Settings every new session is built with.
    pub config: Arc<WatchConfig>,
    /// Upstream long-poll source shared by all sessions.
    pub source: Arc<dyn ResourceSource>,
    /// Live sessions, one per connected client.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Builds state with an empty session registry.
    #[must_use]
    pub fn new(config: WatchConfig, source: Arc<dyn ResourceSource>) -> Self {
        Self {
            config: Arc::new(config),
            source,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}
