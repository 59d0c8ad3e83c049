//! HTTP routes.
//!
//! - `GET /health`
//! - `POST /api/sessions` opens a session
//! - `POST /api/sessions/{id}/messages` runs one turn
//! - `DELETE /api/sessions/{id}` closes a session

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use cookbook_ai::{TurnError, TurnReport};
use cookbook_core::ConversationSessionId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Notice returned when a turn runs out of rounds.
pub const ROUND_LIMIT_NOTICE: &str = "Maximum tool iterations reached.";

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", delete(delete_session))
        .route("/api/sessions/{id}/messages", post(send_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Response body for a newly opened session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub welcome: String,
    pub tools: Vec<String>,
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.sessions.open(state.coordinator.tools()).await;
    let body = SessionCreated {
        session_id: session.id.to_string(),
        welcome: session.welcome_message(),
        tools: session.tools.names(),
    };
    (StatusCode::CREATED, Json(body))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(&id)?;
    state.sessions.remove(session_id).await?;
    tracing::info!(session_id = %session_id, "session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// Request body for a user message.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessage {
    pub content: String,
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Answered,
    RoundLimitReached,
    Failed,
}

/// Response body for a finished turn.
#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub status: TurnStatus,
    pub content: String,
    pub turn_id: String,
    pub rounds: u32,
    pub tool_calls: usize,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SendMessage>,
) -> Result<Response, ApiError> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    let session_id = parse_session_id(&id)?;
    let session = state.sessions.get(session_id).await?;
    let turn = session.begin_turn()?;

    // Detached so a dropped connection cannot cancel the turn midway.
    let coordinator = state.coordinator.clone();
    let utterance = content.to_string();
    let report = tokio::spawn(async move {
        let _turn = turn;
        coordinator.run_turn(&utterance, &session.tools).await
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, session_id = %session_id, "turn task failed");
        ApiError::TurnAborted
    })?;
    Ok(turn_response(report))
}

fn parse_session_id(id: &str) -> Result<ConversationSessionId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::SessionNotFound { id: id.to_string() })
}

fn turn_response(report: TurnReport) -> Response {
    let (status_code, status, content) = match report.outcome {
        Ok(answer) => (StatusCode::OK, TurnStatus::Answered, answer.content),
        Err(TurnError::RoundLimitExceeded { .. }) => (
            StatusCode::OK,
            TurnStatus::RoundLimitReached,
            ROUND_LIMIT_NOTICE.to_string(),
        ),
        Err(TurnError::Inference(e)) => (
            StatusCode::BAD_GATEWAY,
            TurnStatus::Failed,
            format!("Sorry, I encountered an error: {e}"),
        ),
    };
    let body = TurnResponse {
        status,
        content,
        turn_id: report.turn_id.to_string(),
        rounds: report.rounds,
        tool_calls: report.tool_calls,
    };
    (status_code, Json(body)).into_response()
}
