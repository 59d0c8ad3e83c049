//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys (`INFERENCE__ENDPOINT`, `SESSION__IDLE_MINUTES`).
//! Adapter sections come from the library crates.

use cookbook_ai::{CoordinateConfig, InferenceConfig};
use cookbook_integration::{RetrievalConfig, ToolGatewayConfig};
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Inference service configuration.
    pub inference: InferenceConfig,

    /// Knowledge-base configuration. Retrieval is disabled when absent.
    #[serde(default)]
    pub retrieval: Option<RetrievalConfig>,

    /// Tool server configuration. Sessions get no tools when absent.
    #[serde(default)]
    pub tools: Option<ToolGatewayConfig>,

    /// Per-turn limits.
    #[serde(default)]
    pub conversation: CoordinateConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Sessions without a turn for this long are evicted.
    #[serde(default = "default_idle_minutes")]
    pub idle_minutes: i64,

    /// Interval between eviction sweeps, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_idle_minutes() -> i64 {
    60
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

/// Longest accepted idle period: one year.
const MAX_IDLE_MINUTES: i64 = 365 * 24 * 60;

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_minutes: default_idle_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(env: config::Environment) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(env.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.session.validate()?;
        Ok(config)
    }
}

impl SessionConfig {
    /// Rejects values the eviction task cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero sweep interval or an idle period outside
    /// one minute to one year.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.cleanup_interval_seconds == 0 {
            return Err(config::ConfigError::Message(
                "session.cleanup_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if !(1..=MAX_IDLE_MINUTES).contains(&self.idle_minutes) {
            return Err(config::ConfigError::Message(format!(
                "session.idle_minutes must be between 1 and {MAX_IDLE_MINUTES}"
            )));
        }
        Ok(())
    }

    /// The idle period as a duration.
    #[must_use]
    pub fn idle_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.idle_minutes.clamp(1, MAX_IDLE_MINUTES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, config::ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_environment(config::Environment::default().source(Some(map)))
    }

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_minutes, 60);
        assert_eq!(config.cleanup_interval_seconds, 300);
    }

    #[test]
    fn minimal_environment_uses_defaults() {
        let config = load(&[("INFERENCE__ENDPOINT", "http://localhost:8080")]).unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.inference.endpoint, "http://localhost:8080");
        assert_eq!(config.inference.model_id, cookbook_ai::DEFAULT_MODEL_ID);
        assert_eq!(config.inference.timeout_seconds, 60);
        assert!(config.retrieval.is_none());
        assert!(config.tools.is_none());
        assert_eq!(config.conversation.max_rounds, 5);
    }

    #[test]
    fn nested_sections_are_read() {
        let config = load(&[
            ("INFERENCE__ENDPOINT", "http://localhost:8080"),
            ("RETRIEVAL__ENDPOINT", "http://kb.local"),
            ("RETRIEVAL__KNOWLEDGE_BASE_ID", "recipes"),
            ("TOOLS__ENDPOINT", "http://tools.local/mcp"),
            ("TOOLS__TIMEOUT_SECONDS", "12"),
            ("CONVERSATION__MAX_ROUNDS", "3"),
            ("SESSION__IDLE_MINUTES", "15"),
        ])
        .unwrap();

        let retrieval = config.retrieval.unwrap();
        assert_eq!(retrieval.knowledge_base_id, "recipes");
        assert_eq!(retrieval.timeout_seconds, 10);
        let tools = config.tools.unwrap();
        assert_eq!(tools.endpoint, "http://tools.local/mcp");
        assert_eq!(tools.timeout_seconds, 12);
        assert_eq!(config.conversation.max_rounds, 3);
        assert_eq!(config.session.idle_minutes, 15);
    }

    #[test]
    fn zero_cleanup_interval_is_rejected() {
        let err = load(&[
            ("INFERENCE__ENDPOINT", "http://localhost:8080"),
            ("SESSION__CLEANUP_INTERVAL_SECONDS", "0"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("cleanup_interval_seconds"));
    }

    #[test]
    fn idle_minutes_must_be_bounded() {
        for minutes in ["0", "-5", "9223372036854775807"] {
            let err = load(&[
                ("INFERENCE__ENDPOINT", "http://localhost:8080"),
                ("SESSION__IDLE_MINUTES", minutes),
            ])
            .unwrap_err();
            assert!(err.to_string().contains("idle_minutes"), "{minutes}: {err}");
        }
    }

    #[test]
    fn idle_duration_never_overflows() {
        let config = SessionConfig {
            idle_minutes: i64::MAX,
            cleanup_interval_seconds: 1,
        };
        assert_eq!(config.idle_duration(), chrono::Duration::minutes(MAX_IDLE_MINUTES));
    }

    #[test]
    fn inference_endpoint_is_required() {
        assert!(load(&[]).is_err());
    }
}
