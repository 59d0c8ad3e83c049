//! Shared application state.

use crate::config::SessionConfig;
use cookbook_ai::Coordinator;
use cookbook_conversation::SessionManager;

/// State shared by every request handler.
pub struct AppState {
    /// Runs turns against the inference, retrieval and tool services.
    pub coordinator: Coordinator,
    /// Open conversation sessions.
    pub sessions: SessionManager,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state with no open sessions.
    #[must_use]
    pub fn new(coordinator: Coordinator, session_config: SessionConfig) -> Self {
        Self {
            coordinator,
            sessions: SessionManager::new(),
            session_config,
        }
    }

    /// Evicts sessions idle past the configured limit.
    pub async fn evict_idle_sessions(&self) -> usize {
        let idle = self.session_config.idle_duration();
        let evicted = self.sessions.evict_idle(idle).await;
        for id in &evicted {
            tracing::debug!(session_id = %id, "evicted idle session");
        }
        evicted.len()
    }
}
