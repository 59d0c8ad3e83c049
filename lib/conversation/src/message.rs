//! Message types for conversations.
//!
//! Messages follow the Converse wire shape: a role plus an ordered list of
//! content blocks. Block order is significant and is replayed verbatim to the
//! inference service.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The role of a message sender.
///
/// Tool results travel in `User` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User/human message, including batched tool results.
    User,
    /// Assistant/AI message.
    Assistant,
}

/// One block of message content. Exactly one variant is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentBlock {
    /// Plain text.
    Text(String),
    /// A request from the model to invoke a tool.
    ToolUse(ToolUse),
    /// The outcome of a tool invocation, correlated by `tool_use_id`.
    ToolResult(ToolResult),
}

impl ContentBlock {
    /// Creates a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Returns the text if this is a text block.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUse {
    /// Opaque identifier pairing this request with its result.
    pub tool_use_id: String,
    /// Tool name from the catalog.
    pub name: String,
    /// Structured input for the tool.
    #[serde(default = "empty_object")]
    pub input: JsonValue,
}

impl ToolUse {
    /// Creates a tool use request.
    #[must_use]
    pub fn new(tool_use_id: impl Into<String>, name: impl Into<String>, input: JsonValue) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            name: name.into(),
            input,
        }
    }
}

fn empty_object() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

/// The result of one tool invocation, sent back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    /// Identifier of the request this answers.
    pub tool_use_id: String,
    /// Result payload.
    pub content: Vec<ToolResultContent>,
    /// Outcome marker; absent means success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolResultStatus>,
}

impl ToolResult {
    /// Creates a successful result carrying a JSON payload.
    #[must_use]
    pub fn success(tool_use_id: impl Into<String>, output: JsonValue) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: vec![ToolResultContent::Json(output)],
            status: Some(ToolResultStatus::Success),
        }
    }

    /// Creates a failed result carrying an error payload.
    #[must_use]
    pub fn error(tool_use_id: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: vec![ToolResultContent::Json(payload)],
            status: Some(ToolResultStatus::Error),
        }
    }

    /// Returns true if the tool reported a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == Some(ToolResultStatus::Error)
    }

    /// Returns the first JSON payload, if any.
    #[must_use]
    pub fn json(&self) -> Option<&JsonValue> {
        self.content.iter().find_map(|c| match c {
            ToolResultContent::Json(value) => Some(value),
            ToolResultContent::Text(_) => None,
        })
    }
}

/// Payload of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultContent {
    /// Opaque structured output.
    Json(JsonValue),
    /// Plain text output.
    Text(String),
}

/// Outcome of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultStatus {
    Success,
    Error,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role.
    pub role: MessageRole,
    /// Ordered content blocks.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub fn new(role: MessageRole, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    /// Creates a user message with a single text block.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, vec![ContentBlock::text(text)])
    }

    /// Creates an assistant message with a single text block.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, vec![ContentBlock::text(text)])
    }

    /// Batches tool results into one user-role message, preserving order.
    #[must_use]
    pub fn from_tool_results(results: Vec<ToolResult>) -> Self {
        Self::new(
            MessageRole::User,
            results.into_iter().map(ContentBlock::ToolResult).collect(),
        )
    }

    /// Concatenates every text block, in order.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect()
    }

    /// Returns the tool use requests, in order.
    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUse> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse(tool_use) => Some(tool_use),
            _ => None,
        })
    }

    /// Returns the tool results, in order.
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolResult(result) => Some(result),
            _ => None,
        })
    }

    /// Returns true if this message requests any tools.
    #[must_use]
    pub fn has_tool_uses(&self) -> bool {
        self.tool_uses().next().is_some()
    }
}
