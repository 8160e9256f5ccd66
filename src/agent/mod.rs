//! Agent module - orchestration and conversation management
//!
//! Contains the loop that coordinates model calls and tool execution, and the
//! `task` tool that runs nested loops.

pub mod conversation;
pub mod loop_state;
pub mod orchestrator;
pub mod sub_agent;

pub use conversation::Conversation;
pub use loop_state::{LoopPhase, Observation, StepCounter};
pub use orchestrator::{default_preamble, Agent, AgentLoop, RunConfig, RunOutput};
pub use sub_agent::{TaskArgs, TaskTool};
