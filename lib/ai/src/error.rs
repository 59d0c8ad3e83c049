//! Error types for the AI crate.
//!
//! - `LlmError`: failures talking to the inference service
//! - `TurnError`: why a turn ended without a final answer

use std::fmt;

/// Errors from inference operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Provider could not be reached.
    ProviderUnavailable { provider: String, reason: String },
    /// Request failed or was rejected.
    RequestFailed { reason: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "LLM provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// A turn that ended without a final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// The inference service failed; the turn was aborted.
    Inference(LlmError),
    /// The model kept requesting tools past the round budget.
    RoundLimitExceeded { max_rounds: u32 },
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inference(e) => write!(f, "inference failed: {e}"),
            Self::RoundLimitExceeded { max_rounds } => {
                write!(f, "tool use did not finish within {max_rounds} rounds")
            }
        }
    }
}

impl std::error::Error for TurnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Inference(e) => Some(e),
            Self::RoundLimitExceeded { .. } => None,
        }
    }
}

impl From<LlmError> for TurnError {
    fn from(e: LlmError) -> Self {
        Self::Inference(e)
    }
}
