//! Knowledge-base retriever.
//!
//! `POST {endpoint}/knowledgebases/{id}/retrieve` runs a vector search and
//! returns `retrievalResults[].content.text`, most relevant first.

use crate::error::GatewayError;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use cookbook_conversation::{RetrievalError, Retriever, TextSnippet};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Configuration for the knowledge-base service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Base URL of the knowledge-base service.
    pub endpoint: String,
    /// Knowledge base to search.
    pub knowledge_base_id: String,
    /// Bearer token, if the service requires one.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    10
}

impl RetrievalConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, knowledge_base_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            knowledge_base_id: knowledge_base_id.into(),
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Retriever backed by a knowledge-base HTTP service.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    transport: HttpTransport,
    path: String,
}

impl HttpRetriever {
    pub fn new(config: &RetrievalConfig) -> cookbook_core::Result<Self, GatewayError> {
        let kb_id = config.knowledge_base_id.trim();
        if kb_id.is_empty() {
            return Err(GatewayError::InvalidConfig {
                reason: "knowledge base id is empty".to_string(),
            }
            .into());
        }
        let transport = HttpTransport::new(
            &config.endpoint,
            config.api_key.as_deref(),
            Duration::from_secs(config.timeout_seconds),
        )?;
        Ok(Self {
            transport,
            path: format!("knowledgebases/{kb_id}/retrieve"),
        })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    #[instrument(skip(self, query), fields(endpoint = %self.transport.base_url()))]
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<TextSnippet>, RetrievalError> {
        let body = RetrieveRequest {
            retrieval_query: RetrievalQuery { text: query },
            retrieval_configuration: RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration {
                    number_of_results: top_k,
                },
            },
        };
        let response: RetrieveResponse = self.transport.post_json(&self.path, &body).await?;

        let snippets: Vec<TextSnippet> = response
            .retrieval_results
            .into_iter()
            .map(|result| TextSnippet::new(result.content.and_then(|c| c.text).unwrap_or_default()))
            .collect();
        tracing::debug!(results = snippets.len(), "knowledge base search complete");
        Ok(snippets)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest<'a> {
    retrieval_query: RetrievalQuery<'a>,
    retrieval_configuration: RetrievalConfiguration,
}

#[derive(Serialize)]
struct RetrievalQuery<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfiguration {
    vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorSearchConfiguration {
    number_of_results: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Deserialize)]
struct RetrievalResult {
    #[serde(default)]
    content: Option<RetrievalContent>,
}

#[derive(Deserialize)]
struct RetrievalContent {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookbook_conversation::DEFAULT_TOP_K;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn retriever(server: &MockServer) -> HttpRetriever {
        let mut config = RetrievalConfig::new(server.uri(), "kb-recipes");
        config.timeout_seconds = 1;
        HttpRetriever::new(&config).unwrap()
    }

    #[tokio::test]
    async fn returns_snippets_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/knowledgebases/kb-recipes/retrieve"))
            .and(body_json(json!({
                "retrievalQuery": {"text": "How do I make dough?"},
                "retrievalConfiguration": {"vectorSearchConfiguration": {"numberOfResults": 5}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "retrievalResults": [
                    {"content": {"text": "Pierogi dough"}, "score": 0.9},
                    {"content": {"text": "Bread dough"}, "score": 0.7}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let snippets = retriever(&server)
            .retrieve("How do I make dough?", DEFAULT_TOP_K)
            .await
            .unwrap();

        assert_eq!(
            snippets,
            vec![TextSnippet::new("Pierogi dough"), TextSnippet::new("Bread dough")]
        );
    }

    #[tokio::test]
    async fn missing_results_are_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let snippets = retriever(&server).retrieve("soup", 5).await.unwrap();
        assert!(snippets.is_empty());
    }

    #[tokio::test]
    async fn missing_text_is_blank_snippet() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"retrievalResults": [{}]})),
            )
            .mount(&server)
            .await;

        let snippets = retriever(&server).retrieve("soup", 5).await.unwrap();
        assert_eq!(snippets, vec![TextSnippet::new("")]);
    }

    #[tokio::test]
    async fn service_failure_is_retrieval_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = retriever(&server).retrieve("soup", 5).await.unwrap_err();
        assert!(matches!(err, RetrievalError::RequestFailed { .. }));
    }

    #[test]
    fn empty_knowledge_base_id_is_rejected() {
        let config = RetrievalConfig::new("http://kb.local", " ");
        assert!(HttpRetriever::new(&config).is_err());
    }
}
