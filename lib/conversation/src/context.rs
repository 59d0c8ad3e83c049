//! Retrieved reference material and the augmented first message of a turn.

use crate::error::RetrievalError;
use crate::message::{ContentBlock, Message, MessageRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Number of snippets requested per turn.
pub const DEFAULT_TOP_K: usize = 5;

/// One snippet of reference text returned by the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSnippet {
    pub text: String,
}

impl TextSnippet {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Bridge to a knowledge-base search service.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns up to `top_k` snippets relevant to `query`, most relevant first.
    async fn retrieve(&self, query: &str, top_k: usize)
    -> Result<Vec<TextSnippet>, RetrievalError>;
}

/// Retriever used when no knowledge base is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetrieval;

#[async_trait]
impl Retriever for NoRetrieval {
    async fn retrieve(
        &self,
        _query: &str,
        _top_k: usize,
    ) -> Result<Vec<TextSnippet>, RetrievalError> {
        Ok(Vec::new())
    }
}

/// Snippets retrieved for one user turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievedContext {
    snippets: Vec<TextSnippet>,
}

impl RetrievedContext {
    #[must_use]
    pub fn new(snippets: Vec<TextSnippet>) -> Self {
        Self { snippets }
    }

    /// Context used when retrieval failed or is disabled.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snippets.iter().all(|s| s.text.is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    /// Renders the labeled context block, or `None` when there is nothing to show.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let joined = self
            .snippets
            .iter()
            .enumerate()
            .map(|(i, snippet)| format!("Recipe context {}:\n{}", i + 1, snippet.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        Some(format!("Relevant cookbook context:\n{joined}\n\n"))
    }

    /// Builds the first message of a turn: the context block (if any), then the utterance.
    #[must_use]
    pub fn augment(&self, utterance: &str) -> Message {
        let mut content = Vec::with_capacity(2);
        if let Some(block) = self.render() {
            content.push(ContentBlock::Text(block));
        }
        content.push(ContentBlock::text(utterance));
        Message::new(MessageRole::User, content)
    }
}
