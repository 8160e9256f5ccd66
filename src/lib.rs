//! Relay - a tool-using agent runtime
//!
//! Drives a reasoning model through a loop of model calls and tool dispatch
//! until it produces a final answer, with a `task` tool that delegates work to
//! isolated nested loops.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Model Port trait with OpenAI-compatible and scripted backends
//! - **Tools**: Tool trait, registry, and the coding tools
//! - **Agent**: Orchestration loop, conversation state, and delegation
//! - **CLI**: Argument parsing and the one-shot driver
//!
//! # Usage
//!
//! ```rust,no_run
//! use relay::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> relay::Result<()> {
//!     let agent = Agent::from_config(&Config::load())?;
//!     let output = agent.run("List the Rust files in this project").await?;
//!     println!("{}", output.content);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use crate::agent::{Agent, AgentLoop, Conversation, RunConfig, RunOutput};
pub use crate::core::{Config, RelayError, Result};
pub use crate::llm::{ModelPort, ModelResponse};
pub use crate::tools::{Tool, ToolRegistry, TypedTool};
