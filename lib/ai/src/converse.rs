//! HTTP client for a Converse-style inference service.
//!
//! `POST {endpoint}/model/{model_id}/converse` with the turn's messages, the
//! system prompt and, when the catalog is non-empty, a tool configuration.

use crate::backend::{
    ConverseRequest, ConverseResponse, InferenceClient, InferenceConfig, StopSignal, TokenUsage,
};
use crate::error::LlmError;
use async_trait::async_trait;
use cookbook_conversation::{Message, MessageRole, ToolCatalog};
use cookbook_integration::{GatewayError, HttpTransport};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::instrument;

const PROVIDER: &str = "converse";

/// Inference client speaking the Converse JSON protocol over HTTP.
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    transport: HttpTransport,
    path: String,
    model_id: String,
}

impl HttpInferenceClient {
    /// Creates a client from configuration.
    pub fn new(config: &InferenceConfig) -> cookbook_core::Result<Self, LlmError> {
        if config.model_id.trim().is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "model id is empty".to_string(),
            }
            .into());
        }

        let transport = HttpTransport::build(
            &config.endpoint,
            config.api_key.as_deref(),
            Duration::from_secs(config.timeout_seconds),
        )
        .map_err(map_gateway_error)?;

        Ok(Self {
            transport,
            path: format!("model/{}/converse", config.model_id),
            model_id: config.model_id.clone(),
        })
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    #[instrument(
        skip(self, request),
        fields(model = %self.model_id, messages = request.messages.len(), tools = request.tools.len())
    )]
    async fn converse(&self, request: &ConverseRequest<'_>) -> Result<ConverseResponse, LlmError> {
        let body = WireRequest::from_request(request);
        let wire: WireResponse = self
            .transport
            .post_json(&self.path, &body)
            .await
            .map_err(map_gateway_error)?;

        let stop = StopSignal::from_stop_reason(wire.stop_reason.as_deref());
        let message = wire
            .output
            .and_then(|output| output.message)
            .unwrap_or_else(|| Message::new(MessageRole::Assistant, Vec::new()));

        tracing::debug!(
            stop = ?stop,
            blocks = message.content.len(),
            input_tokens = wire.usage.input_tokens,
            output_tokens = wire.usage.output_tokens,
            "inference round complete"
        );

        Ok(ConverseResponse {
            message,
            stop,
            usage: wire.usage,
        })
    }

    fn model(&self) -> &str {
        &self.model_id
    }
}

/// Maps transport failures onto the inference error contract.
fn map_gateway_error(e: GatewayError) -> LlmError {
    match e {
        GatewayError::Timeout => LlmError::Timeout,
        GatewayError::RateLimited { retry_after_secs } => LlmError::RateLimited { retry_after_secs },
        GatewayError::ConnectionFailed { reason } => LlmError::ProviderUnavailable {
            provider: PROVIDER.to_string(),
            reason,
        },
        GatewayError::ProtocolError { reason } => LlmError::ResponseParseFailed { reason },
        GatewayError::InvalidConfig { reason } => LlmError::InvalidConfig { reason },
        other @ (GatewayError::HttpStatus { .. } | GatewayError::Remote { .. }) => {
            LlmError::RequestFailed {
                reason: other.to_string(),
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    messages: &'a [Message],
    system: [SystemBlock<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<WireToolConfig<'a>>,
}

impl<'a> WireRequest<'a> {
    fn from_request(request: &ConverseRequest<'a>) -> Self {
        Self {
            messages: request.messages,
            system: [SystemBlock {
                text: request.system_prompt,
            }],
            tool_config: WireToolConfig::from_catalog(request.tools),
        }
    }
}

#[derive(Serialize)]
struct SystemBlock<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct WireToolConfig<'a> {
    tools: Vec<WireTool<'a>>,
}

impl<'a> WireToolConfig<'a> {
    fn from_catalog(catalog: &'a ToolCatalog) -> Option<Self> {
        if catalog.is_empty() {
            return None;
        }
        let tools = catalog
            .iter()
            .map(|def| WireTool {
                tool_spec: WireToolSpec {
                    name: &def.name,
                    description: &def.description,
                    input_schema: WireSchema {
                        json: &def.input_schema,
                    },
                },
            })
            .collect();
        Some(Self { tools })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool<'a> {
    tool_spec: WireToolSpec<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireToolSpec<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: WireSchema<'a>,
}

#[derive(Serialize)]
struct WireSchema<'a> {
    json: &'a JsonValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    output: Option<WireOutput>,
    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Deserialize)]
struct WireOutput {
    #[serde(default)]
    message: Option<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookbook_conversation::{ContentBlock, ToolDefinition, ToolUse};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpInferenceClient {
        let config = InferenceConfig::new(server.uri())
            .with_model_id("test-model")
            .with_timeout_seconds(1);
        HttpInferenceClient::new(&config).unwrap()
    }

    fn request<'a>(messages: &'a [Message], tools: &'a ToolCatalog) -> ConverseRequest<'a> {
        ConverseRequest {
            messages,
            system_prompt: "You are a helpful cooking assistant.",
            tools,
        }
    }

    #[tokio::test]
    async fn final_answer_round() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/model/test-model/converse"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user", "content": [{"text": "How do I make dough?"}]}],
                "system": [{"text": "You are a helpful cooking assistant."}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stopReason": "end_turn",
                "output": {"message": {"role": "assistant", "content": [{"text": "Mix flour and water."}]}},
                "usage": {"inputTokens": 12, "outputTokens": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messages = [Message::user("How do I make dough?")];
        let tools = ToolCatalog::new();
        let response = client_for(&server)
            .converse(&request(&messages, &tools))
            .await
            .unwrap();

        assert_eq!(response.stop, StopSignal::Done);
        assert_eq!(response.message.text(), "Mix flour and water.");
        assert_eq!(response.usage.total(), 17);
    }

    #[tokio::test]
    async fn tool_use_round() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/model/test-model/converse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stopReason": "tool_use",
                "output": {"message": {"role": "assistant", "content": [
                    {"toolUse": {"toolUseId": "t1", "name": "search_recipes", "input": {"query": "dough"}}}
                ]}}
            })))
            .mount(&server)
            .await;

        let messages = [Message::user("Find dough recipes")];
        let tools = ToolCatalog::new();
        let response = client_for(&server)
            .converse(&request(&messages, &tools))
            .await
            .unwrap();

        assert_eq!(response.stop, StopSignal::ToolUseRequested);
        assert_eq!(
            response.message.content,
            vec![ContentBlock::ToolUse(ToolUse::new(
                "t1",
                "search_recipes",
                json!({"query": "dough"})
            ))]
        );
    }

    #[tokio::test]
    async fn tool_config_sent_only_with_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stopReason": "end_turn",
                "output": {"message": {"role": "assistant", "content": []}}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let messages = [Message::user("hi")];
        let empty = ToolCatalog::new();
        let catalog = ToolCatalog::new().with_tool(
            ToolDefinition::new("search_recipes", "Search recipes")
                .with_input_schema(json!({"type": "object"})),
        );
        client.converse(&request(&messages, &empty)).await.unwrap();
        client.converse(&request(&messages, &catalog)).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let without: JsonValue = received[0].body_json().unwrap();
        let with: JsonValue = received[1].body_json().unwrap();

        assert!(without.get("toolConfig").is_none());
        assert_eq!(
            with["toolConfig"],
            json!({"tools": [{"toolSpec": {
                "name": "search_recipes",
                "description": "Search recipes",
                "inputSchema": {"json": {"type": "object"}}
            }}]})
        );
    }

    #[tokio::test]
    async fn missing_output_message_is_empty_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stopReason": "end_turn"})))
            .mount(&server)
            .await;

        let messages = [Message::user("hi")];
        let tools = ToolCatalog::new();
        let response = client_for(&server)
            .converse(&request(&messages, &tools))
            .await
            .unwrap();

        assert_eq!(response.stop, StopSignal::Done);
        assert_eq!(response.message.role, MessageRole::Assistant);
        assert!(response.message.content.is_empty());
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stopReason": "end_turn"})))
            .expect(1)
            .mount(&server)
            .await;

        let config = InferenceConfig::new(server.uri())
            .with_model_id("test-model")
            .with_api_key("secret");
        let client = HttpInferenceClient::new(&config).unwrap();
        let messages = [Message::user("hi")];
        let tools = ToolCatalog::new();

        assert!(client.converse(&request(&messages, &tools)).await.is_ok());
    }

    #[tokio::test]
    async fn server_error_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
            .mount(&server)
            .await;

        let messages = [Message::user("hi")];
        let tools = ToolCatalog::new();
        let err = client_for(&server)
            .converse(&request(&messages, &tools))
            .await
            .unwrap_err();

        match err {
            LlmError::RequestFailed { reason } => assert!(reason.contains("model overloaded")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn throttling_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let messages = [Message::user("hi")];
        let tools = ToolCatalog::new();
        let err = client_for(&server)
            .converse(&request(&messages, &tools))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            LlmError::RateLimited {
                retry_after_secs: Some(7)
            }
        );
    }

    #[tokio::test]
    async fn malformed_body_is_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let messages = [Message::user("hi")];
        let tools = ToolCatalog::new();
        let err = client_for(&server)
            .converse(&request(&messages, &tools))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::ResponseParseFailed { .. }));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"stopReason": "end_turn"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let messages = [Message::user("hi")];
        let tools = ToolCatalog::new();
        let err = client_for(&server)
            .converse(&request(&messages, &tools))
            .await
            .unwrap_err();

        assert_eq!(err, LlmError::Timeout);
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let config = InferenceConfig::new("http://127.0.0.1:1")
            .with_model_id("test-model")
            .with_timeout_seconds(1);
        let client = HttpInferenceClient::new(&config).unwrap();
        let messages = [Message::user("hi")];
        let tools = ToolCatalog::new();

        let err = client.converse(&request(&messages, &tools)).await.unwrap_err();

        assert!(matches!(err, LlmError::ProviderUnavailable { .. } | LlmError::Timeout));
    }

    #[test]
    fn transport_errors_map_to_inference_errors() {
        assert_eq!(
            map_gateway_error(GatewayError::HttpStatus {
                status: 500,
                body: "model overloaded".to_string()
            }),
            LlmError::RequestFailed {
                reason: "service returned status 500: model overloaded".to_string()
            }
        );
        assert_eq!(
            map_gateway_error(GatewayError::RateLimited {
                retry_after_secs: None
            }),
            LlmError::RateLimited {
                retry_after_secs: None
            }
        );
        assert!(matches!(
            map_gateway_error(GatewayError::ProtocolError {
                reason: "eof".to_string()
            }),
            LlmError::ResponseParseFailed { .. }
        ));
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let config = InferenceConfig::new("  ");
        assert!(HttpInferenceClient::new(&config).is_err());
    }
}
