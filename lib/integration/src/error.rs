//! Error types for the integration crate.
//!
//! `GatewayError` covers transport and protocol failures of the HTTP
//! adapters. Each adapter converts it into the error its contract exposes.

use cookbook_conversation::{RetrievalError, ToolError};
use std::fmt;

/// Errors from talking to a remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Connection to service failed.
    ConnectionFailed { reason: String },
    /// The service answered with a non-success status.
    HttpStatus { status: u16, body: String },
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// The response did not follow the protocol.
    ProtocolError { reason: String },
    /// The service reported a failure inside a well-formed response.
    Remote { code: i64, message: String },
    /// Timeout waiting for response.
    Timeout,
    /// Invalid adapter configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { reason } => {
                write!(f, "connection failed: {reason}")
            }
            Self::HttpStatus { status, body } => {
                if body.is_empty() {
                    write!(f, "service returned status {status}")
                } else {
                    write!(f, "service returned status {status}: {body}")
                }
            }
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::ProtocolError { reason } => {
                write!(f, "protocol error: {reason}")
            }
            Self::Remote { code, message } => {
                write!(f, "remote error {code}: {message}")
            }
            Self::Timeout => write!(f, "operation timed out"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for RetrievalError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Timeout => Self::Timeout,
            GatewayError::ProtocolError { reason } => Self::InvalidResponse { reason },
            other => Self::RequestFailed {
                reason: other.to_string(),
            },
        }
    }
}

impl From<GatewayError> for ToolError {
    fn from(e: GatewayError) -> Self {
        Self::DiscoveryFailed {
            reason: e.to_string(),
        }
    }
}
