//! Inference backend abstraction.
//!
//! One call sends the whole turn so far, the system prompt and the tool
//! catalog, and returns the next assistant message with its stop signal.

use crate::error::LlmError;
use async_trait::async_trait;
use cookbook_conversation::{Message, ToolCatalog};
use serde::{Deserialize, Serialize};

/// Model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";

/// Configuration for the inference service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the conversation service.
    pub endpoint: String,
    /// Model identifier.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Bearer token, if the service requires one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Transport timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl InferenceConfig {
    /// Creates a configuration with default model and timeout.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model_id: default_model_id(),
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the transport timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// One inference round's input.
#[derive(Debug, Clone, Copy)]
pub struct ConverseRequest<'a> {
    /// Messages of the turn so far, oldest first.
    pub messages: &'a [Message],
    /// Fixed system prompt.
    pub system_prompt: &'a str,
    /// Tools the model may request. Empty means no tool configuration is sent.
    pub tools: &'a ToolCatalog,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopSignal {
    /// The model wants tool results before continuing.
    ToolUseRequested,
    /// The model produced its answer.
    Done,
}

impl StopSignal {
    /// Maps a wire stop reason. Only `tool_use` requests tools.
    #[must_use]
    pub fn from_stop_reason(reason: Option<&str>) -> Self {
        match reason {
            Some("tool_use") => Self::ToolUseRequested,
            _ => Self::Done,
        }
    }
}

/// One inference round's output.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverseResponse {
    /// The assistant message.
    pub message: Message,
    /// How the round ended.
    pub stop: StopSignal,
    /// Token usage statistics.
    pub usage: TokenUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Number of input tokens.
    #[serde(default)]
    pub input_tokens: u32,
    /// Number of output tokens.
    #[serde(default)]
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Returns the total number of tokens.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Trait for inference backends.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Runs one inference round.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached or its answer is unusable.
    /// Errors are not retried.
    async fn converse(&self, request: &ConverseRequest<'_>) -> Result<ConverseResponse, LlmError>;

    /// Returns the model name.
    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_tool_use_requests_tools() {
        assert_eq!(
            StopSignal::from_stop_reason(Some("tool_use")),
            StopSignal::ToolUseRequested
        );
        assert_eq!(StopSignal::from_stop_reason(Some("end_turn")), StopSignal::Done);
        assert_eq!(StopSignal::from_stop_reason(Some("max_tokens")), StopSignal::Done);
        assert_eq!(StopSignal::from_stop_reason(None), StopSignal::Done);
    }

    #[test]
    fn token_usage_total() {
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn inference_config_defaults() {
        let config: InferenceConfig =
            serde_json::from_value(serde_json::json!({"endpoint": "http://localhost:8080"}))
                .unwrap();
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.timeout_seconds, 60);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn inference_config_builder() {
        let config = InferenceConfig::new("http://localhost:8080")
            .with_model_id("test-model")
            .with_api_key("secret")
            .with_timeout_seconds(5);
        assert_eq!(config.model_id, "test-model");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout_seconds, 5);
    }
}
