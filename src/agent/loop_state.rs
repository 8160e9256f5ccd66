//! Agent loop state management
//!
//! Tracks the phase of the orchestration loop, the per-instance step counter,
//! and observations produced by tool dispatch.

use serde::{Deserialize, Serialize};

use crate::core::{Message, RelayError, Result};

/// Phase of the orchestration state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    Start,
    ModelCall,
    ToolDispatch,
    End,
    Aborted,
}

impl LoopPhase {
    /// Whether the loop has stopped
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopPhase::End | LoopPhase::Aborted)
    }
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoopPhase::Start => "start",
            LoopPhase::ModelCall => "model_call",
            LoopPhase::ToolDispatch => "tool_dispatch",
            LoopPhase::End => "end",
            LoopPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Counts model calls for one loop instance against a fixed limit
#[derive(Debug, Clone)]
pub struct StepCounter {
    /// Model calls performed so far
    steps: usize,
    /// Maximum allowed model calls
    limit: usize,
}

impl StepCounter {
    /// Create a counter starting at zero
    pub fn new(limit: usize) -> Self {
        Self { steps: 0, limit }
    }

    /// Count one more model call.
    ///
    /// Fails without counting once the limit would be exceeded.
    pub fn advance(&mut self) -> Result<usize> {
        if self.steps >= self.limit {
            return Err(RelayError::StepLimitExceeded { limit: self.limit });
        }
        self.steps += 1;
        Ok(self.steps)
    }

    /// Model calls performed so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// The configured limit
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// An observation from a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Id of the call this observation answers
    pub tool_call_id: String,
    /// Name of the tool that produced this observation
    pub tool_name: String,
    /// Whether the tool execution was successful
    pub success: bool,
    /// Text fed back to the model
    pub output: String,
}

impl Observation {
    /// Build from dispatch output; `Error...` text marks a failed call
    pub fn new(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        let output = output.into();
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            success: !output.starts_with("Error"),
            output,
        }
    }

    /// Create an error observation
    pub fn error(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        error: impl std::fmt::Display,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            success: false,
            output: format!("Error: {}", error),
        }
    }
}

impl From<Observation> for Message {
    fn from(observation: Observation) -> Self {
        Message::tool(observation.tool_call_id, observation.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;

    #[test]
    fn test_step_counter() {
        let mut counter = StepCounter::new(2);
        assert_eq!(counter.advance().unwrap(), 1);
        assert_eq!(counter.advance().unwrap(), 2);
        assert!(matches!(
            counter.advance(),
            Err(RelayError::StepLimitExceeded { limit: 2 })
        ));
        assert_eq!(counter.steps(), 2);
    }

    #[test]
    fn test_zero_limit_aborts_immediately() {
        let mut counter = StepCounter::new(0);
        assert!(counter.advance().is_err());
        assert_eq!(counter.steps(), 0);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(LoopPhase::End.is_terminal());
        assert!(LoopPhase::Aborted.is_terminal());
        assert!(!LoopPhase::ToolDispatch.is_terminal());
        assert_eq!(LoopPhase::ModelCall.to_string(), "model_call");
    }

    #[test]
    fn test_observation_into_message() {
        let ok = Observation::new("c1", "bash", "hello");
        assert!(ok.success);
        let failed = Observation::error("c2", "bash", "task panicked");
        assert!(!failed.success);

        let message: Message = failed.into();
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some("c2"));
        assert_eq!(message.content, "Error: task panicked");
    }
}
