use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while handling a single tool call. These are carried inside messages and
/// shown to the model, so they must stay serializable.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("The tool name was invalid: {0}")]
    InvalidToolName(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that end a conversation rather than a single tool call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversationError {
    #[error("Model did not converge: still requesting tools after {limit} turns")]
    DidNotConverge { limit: usize },
}
