//! Conversation model for the cookbook assistant.
//!
//! This crate provides:
//!
//! - **Messages**: Converse-shaped messages and content blocks
//! - **Tools**: the tool catalog and the `ToolGateway` contract
//! - **Context**: the `Retriever` contract and the augmented first message
//! - **Sessions**: in-memory sessions with a one-turn-at-a-time guard

pub mod context;
pub mod error;
pub mod message;
pub mod session;
pub mod tool;

pub use context::{DEFAULT_TOP_K, NoRetrieval, RetrievedContext, Retriever, TextSnippet};
pub use error::{RetrievalError, SessionError, ToolError};
pub use message::{
    ContentBlock, Message, MessageRole, ToolResult, ToolResultContent, ToolResultStatus, ToolUse,
};
pub use session::{Session, SessionManager, TurnGuard, welcome_message};
pub use tool::{ToolCatalog, ToolDefinition, ToolGateway, ToolOutput};
