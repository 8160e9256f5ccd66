//! Sub-agent support
//!
//! The `task` tool: runs a fresh orchestration loop for a delegated task and
//! returns only its final answer to the parent.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use crate::agent::orchestrator::{AgentLoop, RunConfig};
use crate::core::{RelayError, Result};
use crate::llm::ModelPort;
use crate::tools::{ToolRegistry, TypedTool};

/// Arguments for the task tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TaskArgs {
    /// Task description with full context for the sub agent. Include: (1) the user's goal and
    /// what needs to be done, (2) relevant file paths, modules, and/or code snippets, (3) any
    /// prior analysis results, summaries, or discovered facts that could help, and (4) important
    /// constraints such as tech stack, coding style, do/don't rules, and performance/security
    /// requirements.
    pub input: String,
    /// The system prompt to be used for the sub agent. This should include all relevant context
    /// for the sub agent to work with.
    #[serde(rename = "systemPrompt")]
    pub system_prompt: String,
}

/// Delegates a task to an isolated sub-agent loop
#[derive(Clone)]
pub struct TaskTool {
    /// Backend shared with the parent
    model: Arc<dyn ModelPort>,
    /// Tools available to sub-agents, without `task`
    base: Arc<ToolRegistry>,
    /// Parent preamble; the sub-agent's prompt is appended to it
    preamble: String,
    recursion_limit: usize,
    parallel_tools: bool,
    /// Delegation levels this tool may still open, itself included
    depth_remaining: usize,
    /// Nesting level of the loops this tool starts
    level: usize,
}

impl TaskTool {
    /// Create a delegator with `depth_remaining` levels of budget
    pub fn new(
        model: Arc<dyn ModelPort>,
        base: Arc<ToolRegistry>,
        preamble: impl Into<String>,
        recursion_limit: usize,
        parallel_tools: bool,
        depth_remaining: usize,
    ) -> Self {
        Self {
            model,
            base,
            preamble: preamble.into(),
            recursion_limit,
            parallel_tools,
            depth_remaining,
            level: 1,
        }
    }

    /// Remaining delegation budget
    pub fn depth_remaining(&self) -> usize {
        self.depth_remaining
    }

    /// Registry for one sub-agent run: fresh tool state, and `task` only while budget remains
    fn child_registry(&self, child_preamble: &str) -> ToolRegistry {
        let registry = self.base.fork();
        if self.depth_remaining > 1 {
            let child = Self {
                preamble: child_preamble.to_string(),
                depth_remaining: self.depth_remaining - 1,
                level: self.level + 1,
                ..self.clone()
            };
            registry.with_tool(Arc::new(child))
        } else {
            registry
        }
    }
}

#[async_trait]
impl TypedTool for TaskTool {
    type Args = TaskArgs;

    fn name(&self) -> &str {
        "task"
    }

    fn description(&self) -> &str {
        "Launches a new agent to handle complex, multi-step coding tasks autonomously. The input \
         must include the task goal, all currently known relevant file paths and/or code \
         snippets, any prior analysis results or summaries, plus key constraints (tech stack, \
         style, do/don't rules, performance or security requirements) so the sub agent can work \
         in a single shot with full context."
    }

    async fn execute(&self, args: TaskArgs) -> Result<String> {
        let preamble = format!("{}\n{}", self.preamble, args.system_prompt);
        let config = RunConfig::new(
            Arc::clone(&self.model),
            Arc::new(self.child_registry(&preamble)),
            preamble,
        )
        .with_recursion_limit(self.recursion_limit)
        .with_parallel_tools(self.parallel_tools);

        info!(level = self.level, "Delegating to sub-agent");

        match AgentLoop::nested(config, self.level).run(args.input).await {
            Ok(output) => Ok(output.content),
            Err(e @ RelayError::StepLimitExceeded { .. }) => {
                warn!(level = self.level, error = %e, "Sub-agent stopped early");
                Ok(format!("Error: Sub-agent did not finish: {}", e))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use crate::tools::Tool;

    fn task(depth: usize) -> TaskTool {
        let model: Arc<dyn ModelPort> = Arc::new(ScriptedModel::new(Vec::new()));
        TaskTool::new(model, Arc::new(ToolRegistry::new()), "base", 10, true, depth)
    }

    #[test]
    fn test_schema_uses_camel_case_prompt() {
        let schema = task(1).input_schema();
        assert_eq!(schema["required"], serde_json::json!(["input", "systemPrompt"]));
    }

    #[test]
    fn test_child_registry_respects_budget() {
        assert!(!task(1).child_registry("base").contains("task"));

        let nested = task(3).child_registry("base\nchild");
        let child = nested.resolve("task");
        assert!(child.is_some());
    }
}
