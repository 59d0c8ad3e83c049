//! Service adapters for the cookbook assistant.
//!
//! This crate provides:
//!
//! - **Knowledge base**: `HttpRetriever`, a vector-search `Retriever`
//! - **Tool gateway**: `McpToolGateway`, a JSON-RPC `ToolGateway`, plus
//!   `UnconfiguredGateway` for deployments without a tool server
//! - **Transport**: the shared JSON-over-HTTP client both build on

pub mod error;
pub mod knowledge_base;
pub mod mcp;
pub mod transport;

pub use error::GatewayError;
pub use knowledge_base::{HttpRetriever, RetrievalConfig};
pub use mcp::{McpToolGateway, ToolGatewayConfig, UnconfiguredGateway};
pub use transport::HttpTransport;
