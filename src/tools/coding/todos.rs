//! Todo tool
//!
//! A per-run checklist the model rewrites as it plans and makes progress.
//! Each sub-agent gets its own empty list.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::Result;
use crate::tools::registry::{Tool, TypedTool};

/// Progress of one todo item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// A single todo entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TodoItem {
    /// What needs to be done
    pub content: String,
    /// Current progress
    pub status: TodoStatus,
}

/// Arguments for the write_todos tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TodoArgs {
    /// The complete, updated todo list. Replaces the previous list.
    pub todos: Vec<TodoItem>,
}

/// Keeps the current todo list of one loop
#[derive(Default)]
pub struct TodoTool {
    todos: Mutex<Vec<TodoItem>>,
}

impl TodoTool {
    /// Create a tool with an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current list
    pub async fn todos(&self) -> Vec<TodoItem> {
        self.todos.lock().await.clone()
    }

    fn render(todos: &[TodoItem]) -> String {
        if todos.is_empty() {
            return "Cleared the todo list.".to_string();
        }

        let done = todos
            .iter()
            .filter(|t| t.status == TodoStatus::Completed)
            .count();
        let mut out = format!("Updated todo list ({}/{} completed):", done, todos.len());
        for (i, todo) in todos.iter().enumerate() {
            out.push_str(&format!("\n{}. [{}] {}", i + 1, todo.status, todo.content));
        }
        out
    }
}

#[async_trait]
impl TypedTool for TodoTool {
    type Args = TodoArgs;

    fn name(&self) -> &str {
        "write_todos"
    }

    fn description(&self) -> &str {
        "Create and manage a structured task list for the current work. Use it for complex, \
         multi-step tasks: write the full list up front, mark an item in_progress when starting \
         it and completed as soon as it is done. Each call replaces the whole list. Skip it for \
         simple tasks that take only a few steps."
    }

    async fn execute(&self, args: TodoArgs) -> Result<String> {
        let mut todos = self.todos.lock().await;
        *todos = args.todos;
        debug!(items = todos.len(), "Todo list replaced");
        Ok(Self::render(&todos))
    }

    fn fork(&self) -> Option<Arc<dyn Tool>> {
        Some(Arc::new(Self::new()))
    }
}
