//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing tool calls to handlers.
//! Dispatch never fails on a tool's behalf: unknown names, bad arguments and
//! tool errors all come back as `Error: ...` observations for the model to read.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{RelayError, Result, ToolCall, ToolDefinition};

/// A named capability the model can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry
    fn name(&self) -> &str;

    /// Description advertised to the model
    fn description(&self) -> &str;

    /// JSON Schema of accepted arguments
    fn input_schema(&self) -> Value;

    /// Run the tool. Non-fatal errors are turned into observations by the registry.
    async fn invoke(&self, arguments: Value) -> Result<String>;

    /// A copy with fresh per-run state, for tools that carry any
    fn fork(&self) -> Option<Arc<dyn Tool>> {
        None
    }

    /// Descriptor sent to the model
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(self.name(), self.description(), self.input_schema())
    }
}

/// A tool with a fixed, deserializable argument shape.
///
/// The input schema is generated from `Args`, and arguments are decoded into it
/// before `execute` runs.
#[async_trait]
pub trait TypedTool: Send + Sync {
    /// Argument type
    type Args: DeserializeOwned + JsonSchema + Send;

    /// Unique name within a registry
    fn name(&self) -> &str;

    /// Description advertised to the model
    fn description(&self) -> &str;

    /// Run with decoded arguments
    async fn execute(&self, args: Self::Args) -> Result<String>;

    /// A copy with fresh per-run state, for tools that carry any
    fn fork(&self) -> Option<Arc<dyn Tool>> {
        None
    }
}

#[async_trait]
impl<T: TypedTool> Tool for T {
    fn name(&self) -> &str {
        TypedTool::name(self)
    }

    fn description(&self) -> &str {
        TypedTool::description(self)
    }

    fn input_schema(&self) -> Value {
        input_schema_for::<T::Args>()
    }

    async fn invoke(&self, arguments: Value) -> Result<String> {
        let args: T::Args = serde_json::from_value(arguments)
            .map_err(|e| RelayError::invalid_arguments(TypedTool::name(self), e.to_string()))?;
        self.execute(args).await
    }

    fn fork(&self) -> Option<Arc<dyn Tool>> {
        TypedTool::fork(self)
    }
}

/// Generate a JSON Schema value for an argument type
pub fn input_schema_for<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}));
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    schema
}

/// Registry of available tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    /// Tools indexed by name
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Descriptors in registration order
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a fixed set of tools
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let definition = tool.definition();
        let name = definition.function.name.clone();

        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replacing previously registered tool");
            self.definitions.retain(|d| d.function.name != name);
        }
        self.definitions.push(definition);
    }

    /// Copy of this registry with one more tool
    pub fn with_tool(&self, tool: Arc<dyn Tool>) -> Self {
        let mut registry = self.clone();
        registry.register(tool);
        registry
    }

    /// Copy of this registry where stateful tools start from fresh state
    pub fn fork(&self) -> Self {
        let mut forked = self.clone();
        for tool in forked.tools.values_mut() {
            if let Some(fresh) = tool.fork() {
                *tool = fresh;
            }
        }
        forked
    }

    /// Look up a tool by name
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Whether a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool descriptors, in registration order
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Registered tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a resolved tool, converting every non-fatal failure into an observation
    pub async fn invoke(tool: &dyn Tool, arguments: Value) -> Result<String> {
        let outcome = match check_required(&tool.definition(), &arguments) {
            Ok(()) => tool.invoke(arguments).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(observation) => Ok(observation),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                debug!(tool = %tool.name(), error = %e, "Tool returned an error");
                Ok(format!("Error: {}", e))
            }
        }
    }

    /// Resolve and invoke a tool call
    pub async fn dispatch(&self, call: &ToolCall) -> Result<String> {
        match self.resolve(&call.name) {
            Some(tool) => Self::invoke(tool.as_ref(), call.arguments.clone()).await,
            None => {
                warn!(tool = %call.name, call_id = %call.id, "Model requested an unknown tool");
                Ok(unknown_tool_observation(&call.name))
            }
        }
    }
}

/// Observation produced for a tool name missing from the registry
pub fn unknown_tool_observation(name: &str) -> String {
    format!("Error: Unknown tool \"{}\"", name)
}

/// Check arguments against the descriptor's object shape and required properties
fn check_required(definition: &ToolDefinition, arguments: &Value) -> Result<()> {
    let object = arguments.as_object().ok_or_else(|| {
        RelayError::invalid_arguments(definition.name(), "arguments must be a JSON object")
    })?;

    match definition
        .required_fields()
        .into_iter()
        .find(|field| !object.contains_key(*field))
    {
        Some(missing) => Err(RelayError::invalid_arguments(
            definition.name(),
            format!("missing required field `{}`", missing),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    struct EchoArgs {
        /// Text to echo back
        text: String,
        /// Repeat count
        times: Option<usize>,
    }

    struct EchoTool;

    #[async_trait]
    impl TypedTool for EchoTool {
        type Args = EchoArgs;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo text"
        }

        async fn execute(&self, args: EchoArgs) -> Result<String> {
            Ok(args.text.repeat(args.times.unwrap_or(1)))
        }
    }

    struct FailingTool {
        fatal: bool,
    }

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "fail"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn invoke(&self, _arguments: Value) -> Result<String> {
            if self.fatal {
                Err(RelayError::model("backend unreachable"))
            } else {
                Err(RelayError::tool("disk on fire"))
            }
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::from_tools([
            Arc::new(EchoTool) as Arc<dyn Tool>,
            Arc::new(FailingTool { fatal: false }),
        ])
    }

    #[test]
    fn test_schema_from_args() {
        let schema = EchoTool.input_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["text"].is_object());
        assert_eq!(schema["required"], json!(["text"]));
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn test_registration_order_and_resolve() {
        let registry = registry();
        assert_eq!(registry.names(), vec!["echo", "fail"]);
        assert!(registry.resolve("echo").is_some());
        assert!(registry.resolve("frobnicate").is_none());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = registry();
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["fail", "echo"]);
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let call = ToolCall::new("1", "echo", json!({"text": "ab", "times": 2}));
        assert_eq!(registry().dispatch(&call).await.unwrap(), "abab");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let call = ToolCall::new("1", "frobnicate", json!({}));
        assert_eq!(
            registry().dispatch(&call).await.unwrap(),
            "Error: Unknown tool \"frobnicate\""
        );
    }

    #[tokio::test]
    async fn test_dispatch_missing_required_field() {
        let call = ToolCall::new("1", "echo", json!({"times": 2}));
        let observation = registry().dispatch(&call).await.unwrap();
        assert_eq!(
            observation,
            "Error: Invalid arguments for tool \"echo\": missing required field `text`"
        );
    }

    #[tokio::test]
    async fn test_dispatch_wrong_type_is_observation() {
        let call = ToolCall::new("1", "echo", json!({"text": 5}));
        let observation = registry().dispatch(&call).await.unwrap();
        assert!(observation.starts_with("Error: Invalid arguments for tool \"echo\""));
    }

    #[tokio::test]
    async fn test_tool_error_becomes_observation() {
        let call = ToolCall::new("1", "fail", json!({}));
        let observation = registry().dispatch(&call).await.unwrap();
        assert_eq!(observation, "Error: Tool execution error: disk on fire");
    }

    #[tokio::test]
    async fn test_fatal_error_escapes() {
        let registry = ToolRegistry::from_tools([Arc::new(FailingTool { fatal: true }) as Arc<dyn Tool>]);
        let call = ToolCall::new("1", "fail", json!({}));
        assert!(registry.dispatch(&call).await.is_err());
    }
}
