//! Turn coordination.
//!
//! The `Coordinator` turns one user utterance into a final answer:
//! 1. Retrieves reference snippets (failure only degrades the turn)
//! 2. Sends the augmented message to the inference service
//! 3. Dispatches any requested tools and sends their results back
//! 4. Repeats until the model answers or the round budget runs out

use crate::backend::{ConverseRequest, InferenceClient};
use crate::error::TurnError;
use crate::prompt::COOKBOOK_SYSTEM_PROMPT;
use crate::turn::{ConversationState, FinalAnswer, TurnReport, TurnState};
use cookbook_conversation::{
    DEFAULT_TOP_K, Message, RetrievedContext, Retriever, ToolCatalog, ToolGateway, ToolResult,
    ToolUse,
};
use cookbook_core::TurnId;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

/// Default round budget per turn.
pub const DEFAULT_MAX_ROUNDS: u32 = 5;

/// Limits applied to every turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinateConfig {
    /// Maximum inference rounds per turn.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

impl Default for CoordinateConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

impl CoordinateConfig {
    /// Sets the round budget.
    #[must_use]
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }
}

/// Runs turns against the three collaborating services.
#[derive(Clone)]
pub struct Coordinator {
    inference: Arc<dyn InferenceClient>,
    retriever: Arc<dyn Retriever>,
    tools: Arc<dyn ToolGateway>,
    system_prompt: String,
    config: CoordinateConfig,
}

impl Coordinator {
    /// Creates a coordinator with the cookbook system prompt and default limits.
    #[must_use]
    pub fn new(
        inference: Arc<dyn InferenceClient>,
        retriever: Arc<dyn Retriever>,
        tools: Arc<dyn ToolGateway>,
    ) -> Self {
        Self {
            inference,
            retriever,
            tools,
            system_prompt: COOKBOOK_SYSTEM_PROMPT.to_string(),
            config: CoordinateConfig::default(),
        }
    }

    /// Sets the turn limits.
    #[must_use]
    pub fn with_config(mut self, config: CoordinateConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CoordinateConfig {
        &self.config
    }

    /// Returns the tool gateway, for catalog discovery when a session opens.
    #[must_use]
    pub fn tools(&self) -> &dyn ToolGateway {
        self.tools.as_ref()
    }

    /// Processes one utterance and returns only the outcome.
    pub async fn handle_user_message(
        &self,
        utterance: &str,
        catalog: &ToolCatalog,
    ) -> Result<FinalAnswer, TurnError> {
        self.run_turn(utterance, catalog).await.outcome
    }

    /// Processes one utterance and reports everything the turn did.
    pub async fn run_turn(&self, utterance: &str, catalog: &ToolCatalog) -> TurnReport {
        let turn_id = TurnId::new();
        let span = tracing::info_span!("turn", turn_id = %turn_id);
        self.drive(turn_id, utterance, catalog).instrument(span).await
    }

    async fn drive(&self, turn_id: TurnId, utterance: &str, catalog: &ToolCatalog) -> TurnReport {
        let max_rounds = self.config.max_rounds;
        let mut conversation = ConversationState::default();
        let mut rounds = 0;
        let mut tool_calls = 0;
        let mut state = TurnState::Retrieving;

        let outcome = loop {
            state = match state {
                TurnState::Retrieving => {
                    let context = self.retrieve(utterance).await;
                    conversation.push(context.augment(utterance));
                    if max_rounds == 0 {
                        TurnState::Exceeded
                    } else {
                        TurnState::Inferring { round: 1 }
                    }
                }
                TurnState::Inferring { round } => {
                    rounds = round;
                    let request = ConverseRequest {
                        messages: conversation.messages(),
                        system_prompt: &self.system_prompt,
                        tools: catalog,
                    };
                    match self.inference.converse(&request).await {
                        Ok(response) => {
                            let next =
                                TurnState::after_inference(round, &response.message, response.stop);
                            conversation.push(response.message);
                            next
                        }
                        Err(e) => {
                            tracing::error!(error = %e, round, "inference failed, aborting turn");
                            TurnState::Failed(e)
                        }
                    }
                }
                TurnState::Dispatching { round, requests } => {
                    tool_calls += requests.len();
                    let results = self.dispatch(&requests).await;
                    conversation.push(Message::from_tool_results(results));
                    TurnState::after_dispatch(round, max_rounds)
                }
                TurnState::Done(answer) => break Ok(answer),
                TurnState::Exceeded => {
                    tracing::warn!(max_rounds, "round budget exhausted");
                    break Err(TurnError::RoundLimitExceeded { max_rounds });
                }
                TurnState::Failed(e) => break Err(TurnError::Inference(e)),
            };
        };

        tracing::info!(
            rounds,
            tool_calls,
            messages = conversation.len(),
            answered = outcome.is_ok(),
            "turn finished"
        );

        TurnReport {
            turn_id,
            rounds,
            tool_calls,
            messages: conversation.into_messages(),
            outcome,
        }
    }

    async fn retrieve(&self, utterance: &str) -> RetrievedContext {
        match self.retriever.retrieve(utterance, DEFAULT_TOP_K).await {
            Ok(snippets) => {
                tracing::debug!(snippets = snippets.len(), "retrieved context");
                RetrievedContext::new(snippets)
            }
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed, continuing without context");
                RetrievedContext::empty()
            }
        }
    }

    /// Invokes every requested tool concurrently; results keep request order.
    async fn dispatch(&self, requests: &[ToolUse]) -> Vec<ToolResult> {
        join_all(requests.iter().map(|request| async move {
            tracing::debug!(tool = %request.name, tool_use_id = %request.tool_use_id, "invoking tool");
            let output = self.tools.invoke(&request.name, request.input.clone()).await;
            if output.is_error {
                tracing::warn!(tool = %request.name, payload = %output.payload, "tool reported an error");
                ToolResult::error(request.tool_use_id.clone(), output.payload)
            } else {
                ToolResult::success(request.tool_use_id.clone(), output.payload)
            }
        }))
        .await
    }
}
