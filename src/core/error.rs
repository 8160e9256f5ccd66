//! Custom error types for Relay
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// Reasoning backend failures (unreachable, bad status, undecodable reply)
    #[error("Model error: {0}")]
    ModelPort(String),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A loop ran out of model calls before producing a final answer
    #[error("Step limit of {limit} exceeded without a final answer")]
    StepLimitExceeded { limit: usize },

    /// A message would break the conversation's ordering rules
    #[error("Conversation error: {0}")]
    Conversation(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Requested arguments do not fit the tool's input schema
    #[error("Invalid arguments for tool \"{tool}\": {reason}")]
    InvalidArguments { tool: String, reason: String },
}

/// Convenience Result type for Relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Create a model port error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::ModelPort(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error must escape tool dispatch instead of becoming an observation.
    ///
    /// Only reasoning-backend failures qualify. A sub-agent that runs out of steps is
    /// recoverable for its parent; a backend that cannot be reached is not.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModelPort(_) | Self::Http(_))
    }
}
