//! Tools module - Tool implementations for the agent
//!
//! Contains the coding tools, their shared context, and the tool registry.

pub mod coding;
pub mod context;
pub mod registry;

pub use context::ToolContext;
pub use registry::{Tool, ToolRegistry, TypedTool};

impl ToolRegistry {
    /// Registry holding the standard coding tools
    pub fn with_coding_tools(ctx: &ToolContext) -> Self {
        Self::from_tools(coding::coding_tools(ctx))
    }
}
