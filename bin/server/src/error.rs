//! API error types.
//!
//! Request-level failures that never reach the orchestrator. Turn outcomes,
//! including failed turns, are reported in the response body instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cookbook_conversation::SessionError;
use std::fmt;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The message content was empty after trimming.
    EmptyMessage,
    /// Unknown, removed, or evicted session.
    SessionNotFound { id: String },
    /// A turn is already running for this session.
    TurnInProgress { id: String },
    /// The task running the turn panicked.
    TurnAborted,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "message content is empty"),
            Self::SessionNotFound { id } => write!(f, "session '{id}' not found"),
            Self::TurnInProgress { id } => {
                write!(f, "session '{id}' is already processing a message")
            }
            Self::TurnAborted => write!(f, "turn aborted unexpectedly"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound { id } => Self::SessionNotFound { id: id.to_string() },
            SessionError::TurnInProgress { id } => Self::TurnInProgress { id: id.to_string() },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::EmptyMessage => (StatusCode::BAD_REQUEST, "Message content is empty"),
            Self::SessionNotFound { id } => {
                tracing::debug!(session_id = %id, "session not found");
                (StatusCode::NOT_FOUND, "Session not found")
            }
            Self::TurnInProgress { id } => {
                tracing::debug!(session_id = %id, "turn already in progress");
                (StatusCode::CONFLICT, "A message is already being processed")
            }
            Self::TurnAborted => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The message could not be processed",
            ),
        };

        (status, message).into_response()
    }
}
