//! Inference and turn coordination for the cookbook assistant.
//!
//! This crate provides:
//!
//! - **Inference**: the `InferenceClient` contract and an HTTP Converse client
//! - **Coordinate**: the bounded tool-use loop that turns one utterance into an answer
//!
//! Turns are driven by an explicit state machine (`turn::TurnState`) over an
//! append-only message list.

pub mod backend;
pub mod converse;
pub mod coordinate;
pub mod error;
pub mod prompt;
pub mod turn;

pub use backend::{
    ConverseRequest, ConverseResponse, DEFAULT_MODEL_ID, InferenceClient, InferenceConfig,
    StopSignal, TokenUsage,
};
pub use converse::HttpInferenceClient;
pub use coordinate::{CoordinateConfig, Coordinator, DEFAULT_MAX_ROUNDS};
pub use error::{LlmError, TurnError};
pub use prompt::COOKBOOK_SYSTEM_PROMPT;
pub use turn::{ConversationState, FinalAnswer, TurnReport, TurnState};
