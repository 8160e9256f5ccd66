//! Coding tools module
//!
//! Shell, filesystem and search tools for working inside a project tree,
//! plus a per-run todo list.

mod bash;
mod edit;
mod glob;
mod grep;
mod read;
mod todos;
mod write;

use std::sync::Arc;

pub use bash::{BashArgs, BashTool};
pub use edit::{EditArgs, EditTool};
pub use glob::{GlobArgs, GlobTool};
pub use grep::{GrepArgs, GrepTool, OutputMode};
pub use read::{ReadArgs, ReadTool};
pub use todos::{TodoArgs, TodoItem, TodoStatus, TodoTool};
pub use write::{WriteArgs, WriteTool};

use crate::tools::context::ToolContext;
use crate::tools::registry::Tool;

/// The standard coding tool set, in advertised order
pub fn coding_tools(ctx: &ToolContext) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(BashTool::new(ctx.clone())),
        Arc::new(EditTool::new(ctx.clone())),
        Arc::new(GlobTool::new(ctx.clone())),
        Arc::new(GrepTool::new(ctx.clone())),
        Arc::new(ReadTool::new(ctx.clone())),
        Arc::new(WriteTool::new(ctx.clone())),
        Arc::new(TodoTool::new()),
    ]
}
