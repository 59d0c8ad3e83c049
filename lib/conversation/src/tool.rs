//! Tool catalog and gateway contract.
//!
//! The catalog is discovered from the tool service once per session and is
//! immutable afterwards. Invoking a tool never fails at the type level: any
//! transport or remote failure comes back as an error payload.

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Definition of a tool available during conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// JSON schema for input parameters.
    #[serde(default = "empty_schema")]
    pub input_schema: JsonValue,
}

fn empty_schema() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

impl ToolDefinition {
    /// Creates a new tool definition with an empty input schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: empty_schema(),
        }
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: JsonValue) -> Self {
        self.input_schema = schema;
        self
    }
}

/// The ordered set of tools offered to the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolCatalog {
    definitions: Vec<ToolDefinition>,
}

impl ToolCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool definition.
    #[must_use]
    pub fn with_tool(mut self, definition: ToolDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Returns all tool definitions in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.definitions.iter()
    }

    /// Returns the tool names in discovery order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.name.clone()).collect()
    }

    /// Returns the number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl FromIterator<ToolDefinition> for ToolCatalog {
    fn from_iter<I: IntoIterator<Item = ToolDefinition>>(iter: I) -> Self {
        Self {
            definitions: iter.into_iter().collect(),
        }
    }
}

/// Output of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Opaque result payload, embedded unvalidated.
    pub payload: JsonValue,
    /// Whether the payload describes a failure.
    pub is_error: bool,
}

impl ToolOutput {
    /// Creates a successful output.
    #[must_use]
    pub fn success(payload: JsonValue) -> Self {
        Self {
            payload,
            is_error: false,
        }
    }

    /// Creates a failed output with an `{"error": message}` payload.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            payload: serde_json::json!({ "error": message.into() }),
            is_error: true,
        }
    }
}

/// Bridge to a tool-execution service.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// Discovers the tools the service offers.
    async fn list_tools(&self) -> Result<ToolCatalog, ToolError>;

    /// Invokes a tool. Failures are returned as error payloads.
    async fn invoke(&self, name: &str, input: JsonValue) -> ToolOutput;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_preserves_order() {
        let catalog = ToolCatalog::new()
            .with_tool(ToolDefinition::new("search_recipes", "Search"))
            .with_tool(ToolDefinition::new("create_recipe", "Create"));

        assert_eq!(catalog.names(), ["search_recipes", "create_recipe"]);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("create_recipe").is_some());
        assert!(catalog.get("delete_recipe").is_none());
    }

    #[test]
    fn definition_defaults_missing_fields() {
        let def: ToolDefinition = serde_json::from_value(json!({"name": "list_recipes"})).unwrap();
        assert_eq!(def.description, "");
        assert_eq!(def.input_schema, json!({}));
    }

    #[test]
    fn definition_reads_input_schema() {
        let def: ToolDefinition = serde_json::from_value(json!({
            "name": "search_recipes",
            "description": "Search recipes",
            "inputSchema": {"type": "object", "properties": {"query": {"type": "string"}}}
        }))
        .unwrap();
        assert_eq!(def.input_schema["properties"]["query"]["type"], "string");
    }

    #[test]
    fn failure_output_wraps_message() {
        let output = ToolOutput::failure("timeout");
        assert!(output.is_error);
        assert_eq!(output.payload, json!({"error": "timeout"}));
    }
}
