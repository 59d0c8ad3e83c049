//! Conversation session management.
//!
//! A session holds the tool catalog discovered when it was opened and a turn
//! guard admitting one turn at a time. Sessions live in memory only; the
//! manager evicts idle ones on request.

use crate::error::SessionError;
use crate::tool::{ToolCatalog, ToolGateway};
use chrono::{DateTime, Duration, Utc};
use cookbook_core::ConversationSessionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedMutexGuard, RwLock};

/// A conversation session.
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier.
    pub id: ConversationSessionId,
    /// Tools discovered when the session was opened.
    pub tools: ToolCatalog,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    last_active_at: Mutex<DateTime<Utc>>,
    turn_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Session {
    /// Creates a new session with the given tool catalog.
    #[must_use]
    pub fn new(tools: ToolCatalog) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationSessionId::new(),
            tools,
            created_at: now,
            last_active_at: Mutex::new(now),
            turn_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// When the session last started a turn.
    #[must_use]
    pub fn last_active_at(&self) -> DateTime<Utc> {
        *self
            .last_active_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self) {
        *self
            .last_active_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Utc::now();
    }

    /// Admits a turn. Fails if another turn holds the guard.
    pub fn begin_turn(&self) -> Result<TurnGuard, SessionError> {
        let guard = Arc::clone(&self.turn_lock)
            .try_lock_owned()
            .map_err(|_| SessionError::TurnInProgress { id: self.id })?;
        self.touch();
        Ok(TurnGuard { _guard: guard })
    }

    /// Returns true if a turn is currently running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.turn_lock.try_lock().is_err()
    }

    /// Greeting shown when the session opens.
    #[must_use]
    pub fn welcome_message(&self) -> String {
        welcome_message(&self.tools)
    }
}

/// Held for the duration of one turn; dropping it admits the next turn.
#[derive(Debug)]
pub struct TurnGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Builds the greeting for a session with the given tools.
#[must_use]
pub fn welcome_message(tools: &ToolCatalog) -> String {
    let mut message = String::from(
        "Welcome to the CookBook assistant! I'm your AI cooking assistant.\n\n\
         I can help you with:\n\
         - Finding recipes from the cookbook\n\
         - Answering cooking questions\n\
         - Providing ingredient substitutions\n\
         - Explaining cooking techniques",
    );
    if !tools.is_empty() {
        message.push_str("\n- Adding new recipes to the cookbook");
    }
    message.push_str("\n\nWhat would you like to cook today?");
    message
}

/// In-memory registry of open sessions.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<ConversationSessionId, Arc<Session>>>,
}

impl SessionManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session, discovering the tool catalog once.
    ///
    /// Discovery failure leaves the session with no tools.
    pub async fn open(&self, gateway: &dyn ToolGateway) -> Arc<Session> {
        let tools = match gateway.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                tracing::warn!(error = %e, "tool discovery failed, continuing without tools");
                ToolCatalog::new()
            }
        };
        self.insert(Session::new(tools)).await
    }

    /// Registers an already built session.
    pub async fn insert(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::clone(&session));
        tracing::info!(
            session_id = %session.id,
            tools = session.tools.len(),
            "session opened"
        );
        session
    }

    /// Gets a session by ID.
    pub async fn get(&self, id: ConversationSessionId) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound { id })
    }

    /// Removes a session.
    pub async fn remove(&self, id: ConversationSessionId) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(SessionError::NotFound { id })
    }

    /// Removes sessions idle for longer than `idle`, skipping those mid-turn.
    pub async fn evict_idle(&self, idle: Duration) -> Vec<ConversationSessionId> {
        let cutoff = Utc::now() - idle;
        let mut sessions = self.sessions.write().await;
        let expired: Vec<_> = sessions
            .values()
            .filter(|s| s.last_active_at() < cutoff && !s.is_busy())
            .map(|s| s.id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        expired
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
