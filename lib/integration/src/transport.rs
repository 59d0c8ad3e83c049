//! Shared JSON-over-HTTP transport for the adapters.

use crate::error::GatewayError;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A reqwest client bound to one base URL, with an optional bearer token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Creates a transport. The base URL must be non-empty.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> cookbook_core::Result<Self, GatewayError> {
        Ok(Self::build(base_url, api_key, timeout)?)
    }

    /// Like [`HttpTransport::new`], for callers that map the error into their own type.
    pub fn build(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(GatewayError::InvalidConfig {
                reason: "endpoint is empty".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.filter(|key| !key.is_empty()).map(str::to_string),
        })
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` onto the base URL. An empty path addresses the base URL itself.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// POSTs `body` as JSON and decodes a JSON response.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, GatewayError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self.client.post(&url).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, endpoint = %url, "request failed");
            map_send_error(&e)
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(GatewayError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                endpoint = %url,
                status = %status,
                body = %body,
                "service returned error"
            );
            return Err(GatewayError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| map_send_error(&e))?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::ProtocolError {
            reason: e.to_string(),
        })
    }
}

fn map_send_error(e: &reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::ConnectionFailed {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value as JsonValue, json};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer, api_key: Option<&str>) -> HttpTransport {
        HttpTransport::new(&server.uri(), api_key, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn url_joining() {
        let t = HttpTransport::new("http://kb.local/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(t.base_url(), "http://kb.local");
        assert_eq!(t.url(""), "http://kb.local");
        assert_eq!(t.url("/knowledgebases/kb1/retrieve"), "http://kb.local/knowledgebases/kb1/retrieve");
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        assert!(HttpTransport::new("", None, Duration::from_secs(1)).is_err());
        assert!(matches!(
            HttpTransport::build(" / ", None, Duration::from_secs(1)),
            Err(GatewayError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn decodes_json_and_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let value: JsonValue = transport(&server, Some("token"))
            .post_json("echo", &json!({}))
            .await
            .unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn status_errors_carry_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let err = transport(&server, None)
            .post_json::<_, JsonValue>("", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::HttpStatus {
                status: 503,
                body: "down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn non_json_body_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = transport(&server, None)
            .post_json::<_, JsonValue>("", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ProtocolError { .. }));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = transport(&server, None)
            .post_json::<_, JsonValue>("", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Timeout);
    }
}
