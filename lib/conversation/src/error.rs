//! Error types for the conversation crate.
//!
//! - `SessionError`: session lookup and turn admission
//! - `RetrievalError`: knowledge-base search failures (never fatal to a turn)
//! - `ToolError`: tool catalog discovery failures
//!
//! Failures of an individual tool call are not errors here; they travel as
//! data inside a `ToolOutput`.

use cookbook_core::ConversationSessionId;
use std::fmt;

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session not found (never created, removed, or evicted).
    NotFound { id: ConversationSessionId },
    /// A turn is already running for this session.
    TurnInProgress { id: ConversationSessionId },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "session not found: {id}"),
            Self::TurnInProgress { id } => {
                write!(f, "a turn is already in progress for session {id}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Errors from the knowledge-base search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    /// The request could not be delivered or the service rejected it.
    RequestFailed { reason: String },
    /// The service did not answer in time.
    Timeout,
    /// The service answered with something that is not a search result.
    InvalidResponse { reason: String },
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => write!(f, "retrieval request failed: {reason}"),
            Self::Timeout => write!(f, "retrieval request timed out"),
            Self::InvalidResponse { reason } => {
                write!(f, "invalid retrieval response: {reason}")
            }
        }
    }
}

impl std::error::Error for RetrievalError {}

/// Errors from tool catalog discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No tool service is configured.
    NotConfigured,
    /// The tool service could not list its tools.
    DiscoveryFailed { reason: String },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "tool gateway is not configured"),
            Self::DiscoveryFailed { reason } => write!(f, "tool discovery failed: {reason}"),
        }
    }
}

impl std::error::Error for ToolError {}
