//! Model Port trait for abstracting reasoning backends
//!
//! Backends decode their wire format once into [`ModelResponse`]; nothing past this
//! boundary looks at raw response shapes.

use async_trait::async_trait;

use crate::core::{Message, Result, ToolCall, ToolDefinition};

/// A decoded model reply
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// Terminal answer
    Text { content: String },
    /// One or more requested tool invocations, in order
    ToolCalls {
        /// Any text the model produced alongside the calls
        content: String,
        calls: Vec<ToolCall>,
    },
}

impl ModelResponse {
    /// Create a terminal text response
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Create a tool-call response, collapsing an empty call list into text
    pub fn tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        let content = content.into();
        if calls.is_empty() {
            Self::Text { content }
        } else {
            Self::ToolCalls { content, calls }
        }
    }

    /// Whether this response ends the loop
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    /// Convert into the assistant message appended to the conversation
    pub fn into_message(self) -> Message {
        match self {
            Self::Text { content } => Message::assistant(content),
            Self::ToolCalls { content, calls } => Message::assistant_with_tools(content, calls),
        }
    }
}

/// Trait for reasoning backends
#[async_trait]
pub trait ModelPort: Send + Sync {
    /// Produce the next assistant turn for a conversation.
    ///
    /// Errors are fatal to the calling loop; retries belong inside the backend.
    async fn complete(
        &self,
        system_preamble: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse>;

    /// Get the provider name
    fn name(&self) -> &str;
}
