//! Conversation state
//!
//! An append-only message log owned by one loop instance. Tool messages are
//! checked against the assistant message they answer before they are accepted.

use std::collections::HashMap;

use crate::core::{Message, RelayError, Result, Role, ToolCall};

/// Ordered, append-only message history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation holding a single user instruction
    pub fn seeded(instruction: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(instruction)],
        }
    }

    /// Rebuild a conversation from recorded messages, checking every append
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Result<Self> {
        let mut conversation = Self::new();
        for message in messages {
            conversation.append(message)?;
        }
        Ok(conversation)
    }

    /// Add a message to the end.
    ///
    /// A tool message must answer a call of the latest assistant message that has
    /// not been answered yet; anything else is rejected and nothing is appended.
    pub fn append(&mut self, message: Message) -> Result<()> {
        if message.role == Role::Tool {
            self.check_tool_message(&message)?;
        }
        self.messages.push(message);
        Ok(())
    }

    fn check_tool_message(&self, message: &Message) -> Result<()> {
        let id = message.tool_call_id.as_deref().ok_or_else(|| {
            RelayError::Conversation("tool message without a tool_call_id".to_string())
        })?;

        let pending = self.pending_tool_calls();
        if pending.iter().any(|call| call.id == id) {
            Ok(())
        } else {
            Err(RelayError::Conversation(format!(
                "tool_call_id \"{}\" does not match an unanswered call of the preceding assistant message",
                id
            )))
        }
    }

    /// Calls of the latest assistant message that have no tool message yet, in order.
    ///
    /// Empty unless the tail of the log is that assistant message plus the tool
    /// messages answering it.
    pub fn pending_tool_calls(&self) -> Vec<&ToolCall> {
        let Some(index) = self.messages.iter().rposition(|m| m.role != Role::Tool) else {
            return Vec::new();
        };

        let request = &self.messages[index];
        if !request.has_tool_calls() {
            return Vec::new();
        }

        // Matched by occurrence, so repeated ids each need their own answer
        let mut answered: HashMap<&str, usize> = HashMap::new();
        for id in self.messages[index + 1..]
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
        {
            *answered.entry(id).or_default() += 1;
        }

        request
            .tool_calls
            .iter()
            .filter(|call| match answered.get_mut(call.id.as_str()) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    false
                }
                _ => true,
            })
            .collect()
    }

    /// The most recently appended message
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The full ordered history, as submitted to the model
    pub fn as_context(&self) -> &[Message] {
        &self.messages
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consume the conversation, yielding its messages
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
