//! Agent orchestrator
//!
//! The orchestration loop: alternate model calls and tool dispatch over one
//! conversation until the model answers in plain text or the step limit is hit.
//! Implements a ReAct-style reasoning loop (Thought → Action → Observation).

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::agent::conversation::Conversation;
use crate::agent::loop_state::{LoopPhase, Observation, StepCounter};
use crate::agent::sub_agent::TaskTool;
use crate::core::{Config, RelayError, Result, ToolCall};
use crate::llm::{ModelPort, OpenAiCompatible};
use crate::tools::{ToolContext, ToolRegistry};

const REACT_INSTRUCTIONS: &str = "\
When given a task:
1. Think about what you need to do
2. Use the appropriate tool to gather information or make changes
3. Observe the result
4. Repeat until the task is complete
";

/// Fixed preamble naming the project root, with optional extra instructions
pub fn default_preamble(project_root: &Path, extra: Option<&str>) -> String {
    let mut preamble = format!(
        "---\nPROJECT_ROOT: {}\n---\n\n{}",
        project_root.display(),
        REACT_INSTRUCTIONS
    );
    if let Some(extra) = extra.filter(|e| !e.trim().is_empty()) {
        preamble.push('\n');
        preamble.push_str(extra);
    }
    preamble
}

/// Settings shared read-only by a loop and every sub-agent it spawns
#[derive(Clone)]
pub struct RunConfig {
    /// Reasoning backend
    pub model: Arc<dyn ModelPort>,
    /// Tools advertised to the model
    pub tools: Arc<ToolRegistry>,
    /// System preamble sent with every model call
    pub system_preamble: String,
    /// Maximum model calls per loop instance
    pub recursion_limit: usize,
    /// Run the calls of one dispatch step concurrently
    pub parallel_tools: bool,
}

impl RunConfig {
    /// Create a run configuration with default limits
    pub fn new(
        model: Arc<dyn ModelPort>,
        tools: Arc<ToolRegistry>,
        system_preamble: impl Into<String>,
    ) -> Self {
        let defaults = crate::core::config::AgentConfig::default();
        Self {
            model,
            tools,
            system_preamble: system_preamble.into(),
            recursion_limit: defaults.recursion_limit,
            parallel_tools: defaults.parallel_tools,
        }
    }

    /// Set the per-instance step limit
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Enable or disable concurrent tool execution
    pub fn with_parallel_tools(mut self, parallel: bool) -> Self {
        self.parallel_tools = parallel;
        self
    }
}

/// Result of a loop run that reached End
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Content of the final assistant message
    pub content: String,
    /// Model calls performed
    pub steps: usize,
    /// The full conversation, ending with the final assistant message
    pub conversation: Conversation,
}

/// One orchestration loop configuration; each `run` is an independent instance
pub struct AgentLoop {
    config: RunConfig,
    /// Nesting level, for logging only
    depth: usize,
}

impl AgentLoop {
    /// Create a top-level loop
    pub fn new(config: RunConfig) -> Self {
        Self { config, depth: 0 }
    }

    /// Create a loop nested `depth` levels below the top
    pub fn nested(config: RunConfig, depth: usize) -> Self {
        Self { config, depth }
    }

    /// The run configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Seed a fresh conversation with `instruction` and run it to completion
    pub async fn run(&self, instruction: impl Into<String>) -> Result<RunOutput> {
        self.run_conversation(Conversation::seeded(instruction)).await
    }

    /// Run an existing conversation to completion.
    ///
    /// Starts in tool dispatch when the tail is an assistant message with
    /// unanswered calls, otherwise with a model call.
    pub async fn run_conversation(&self, mut conversation: Conversation) -> Result<RunOutput> {
        if conversation.is_empty() {
            return Err(RelayError::Conversation(
                "cannot run an empty conversation".to_string(),
            ));
        }

        let mut counter = StepCounter::new(self.config.recursion_limit);
        let mut phase = if conversation.pending_tool_calls().is_empty() {
            LoopPhase::Start
        } else {
            LoopPhase::ToolDispatch
        };

        info!(
            depth = self.depth,
            limit = counter.limit(),
            messages = conversation.len(),
            "Starting agent loop"
        );

        loop {
            phase = match phase {
                LoopPhase::Start => LoopPhase::ModelCall,
                LoopPhase::ModelCall => match counter.advance() {
                    Ok(step) => self.model_call(&mut conversation, step).await?,
                    Err(_) => LoopPhase::Aborted,
                },
                LoopPhase::ToolDispatch => {
                    self.dispatch(&mut conversation).await?;
                    LoopPhase::ModelCall
                }
                LoopPhase::End => {
                    let content = conversation
                        .last_message()
                        .map(|m| m.content.clone())
                        .unwrap_or_default();
                    info!(depth = self.depth, steps = counter.steps(), "Agent loop finished");
                    return Ok(RunOutput {
                        content,
                        steps: counter.steps(),
                        conversation,
                    });
                }
                LoopPhase::Aborted => {
                    warn!(
                        depth = self.depth,
                        limit = counter.limit(),
                        "Step limit reached without a final answer"
                    );
                    return Err(RelayError::StepLimitExceeded {
                        limit: counter.limit(),
                    });
                }
            };
        }
    }

    /// Ask the model for the next turn and append it
    async fn model_call(&self, conversation: &mut Conversation, step: usize) -> Result<LoopPhase> {
        debug!(
            depth = self.depth,
            step,
            model = %self.config.model.name(),
            "Calling model"
        );

        let response = self
            .config
            .model
            .complete(
                &self.config.system_preamble,
                conversation.as_context(),
                self.config.tools.definitions(),
            )
            .await?;

        let message = response.into_message();
        let next = if message.has_tool_calls() {
            debug!(depth = self.depth, step, calls = message.tool_calls.len(), "Model requested tools");
            LoopPhase::ToolDispatch
        } else {
            LoopPhase::End
        };

        conversation.append(message)?;
        Ok(next)
    }

    /// Execute every pending call and append one observation per call, in call order
    async fn dispatch(&self, conversation: &mut Conversation) -> Result<()> {
        let calls: Vec<ToolCall> = conversation
            .pending_tool_calls()
            .into_iter()
            .cloned()
            .collect();

        let observations = if self.config.parallel_tools {
            let handles: Vec<_> = calls.iter().map(|call| self.spawn_call(call)).collect();
            let joined = join_all(handles).await;
            calls
                .iter()
                .zip(joined)
                .map(|(call, result)| Self::collect(call, result))
                .collect::<Result<Vec<_>>>()?
        } else {
            let mut observations = Vec::with_capacity(calls.len());
            for call in &calls {
                let result = self.spawn_call(call).await;
                observations.push(Self::collect(call, result)?);
            }
            observations
        };

        for observation in observations {
            if !observation.success {
                debug!(
                    depth = self.depth,
                    tool = %observation.tool_name,
                    call_id = %observation.tool_call_id,
                    "Tool call produced an error observation"
                );
            }
            conversation.append(observation.into())?;
        }
        Ok(())
    }

    fn spawn_call(&self, call: &ToolCall) -> JoinHandle<Result<String>> {
        debug!(depth = self.depth, tool = %call.name, call_id = %call.id, "Dispatching tool");
        let tools = Arc::clone(&self.config.tools);
        let call = call.clone();
        tokio::spawn(async move { tools.dispatch(&call).await })
    }

    /// Turn a joined dispatch into an observation; only fatal errors escape
    fn collect(
        call: &ToolCall,
        result: std::result::Result<Result<String>, tokio::task::JoinError>,
    ) -> Result<Observation> {
        match result {
            Ok(Ok(output)) => Ok(Observation::new(&call.id, &call.name, output)),
            Ok(Err(e)) => Err(e),
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool task failed");
                Ok(Observation::error(
                    &call.id,
                    &call.name,
                    format!("tool task failed: {}", e),
                ))
            }
        }
    }
}

/// Top-level agent assembled from configuration
pub struct Agent {
    inner: AgentLoop,
}

impl Agent {
    /// Build the backend, the coding tools, and (with depth budget) the `task` tool
    pub fn from_config(config: &Config) -> Result<Self> {
        let model: Arc<dyn ModelPort> = Arc::new(OpenAiCompatible::from_config(config)?);
        let ctx = ToolContext::from_config(config);
        Ok(Self::with_model(config, model, ToolRegistry::with_coding_tools(&ctx)))
    }

    /// Build around any backend and base tool set
    pub fn with_model(config: &Config, model: Arc<dyn ModelPort>, base: ToolRegistry) -> Self {
        let preamble = default_preamble(
            &config.working_dir(),
            config.agent.system_prompt.as_deref(),
        );
        let base = Arc::new(base);

        let tools = if config.agent.max_depth > 0 {
            let task = TaskTool::new(
                Arc::clone(&model),
                Arc::clone(&base),
                preamble.clone(),
                config.agent.recursion_limit,
                config.agent.parallel_tools,
                config.agent.max_depth,
            );
            Arc::new(base.with_tool(Arc::new(task)))
        } else {
            base
        };

        let run_config = RunConfig::new(model, tools, preamble)
            .with_recursion_limit(config.agent.recursion_limit)
            .with_parallel_tools(config.agent.parallel_tools);

        Self {
            inner: AgentLoop::new(run_config),
        }
    }

    /// Names of the tools advertised at top level
    pub fn tool_names(&self) -> Vec<&str> {
        self.inner.config().tools.names()
    }

    /// Run one instruction to a final answer
    pub async fn run(&self, instruction: impl Into<String>) -> Result<RunOutput> {
        self.inner.run(instruction).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Message, Role};
    use crate::llm::{ModelResponse, ScriptedModel};
    use serde_json::json;

    fn scripted(responses: Vec<ModelResponse>) -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel::new(responses))
    }

    fn agent_loop(model: Arc<ScriptedModel>, limit: usize) -> AgentLoop {
        AgentLoop::new(
            RunConfig::new(model, Arc::new(ToolRegistry::new()), "preamble").with_recursion_limit(limit),
        )
    }

    #[test]
    fn test_default_preamble() {
        let preamble = default_preamble(Path::new("/work"), None);
        assert!(preamble.starts_with("---\nPROJECT_ROOT: /work\n---\n"));
        assert!(preamble.contains("Repeat until the task is complete"));

        let extended = default_preamble(Path::new("/work"), Some("Be brief."));
        assert!(extended.ends_with("\nBe brief."));
    }

    #[tokio::test]
    async fn test_text_response_ends_after_one_step() {
        let model = scripted(vec![ModelResponse::text("hi")]);
        let output = agent_loop(model.clone(), 5).run("hello").await.unwrap();

        assert_eq!(output.content, "hi");
        assert_eq!(output.steps, 1);
        assert_eq!(output.conversation.len(), 2);

        let requests = model.requests().await;
        assert_eq!(requests[0].system_preamble, "preamble");
        assert_eq!(requests[0].messages, vec![Message::user("hello")]);
    }

    #[tokio::test]
    async fn test_empty_conversation_rejected() {
        let model = scripted(vec![]);
        let result = agent_loop(model, 5).run_conversation(Conversation::new()).await;
        assert!(matches!(result, Err(RelayError::Conversation(_))));
    }

    #[tokio::test]
    async fn test_resumes_in_tool_dispatch() {
        let conversation = Conversation::from_messages(vec![
            Message::user("go"),
            Message::assistant_with_tools("", vec![ToolCall::new("c1", "missing", json!({}))]),
        ])
        .unwrap();

        let model = scripted(vec![ModelResponse::text("recovered")]);
        let output = agent_loop(model, 5).run_conversation(conversation).await.unwrap();

        assert_eq!(output.steps, 1);
        let tool_message = &output.conversation.as_context()[2];
        assert_eq!(tool_message.role, Role::Tool);
        assert_eq!(tool_message.content, "Error: Unknown tool \"missing\"");
    }
}
