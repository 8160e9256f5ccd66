//! Write file tool
//!
//! Creates or overwrites a file, making parent directories as needed.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::Result;
use crate::tools::context::ToolContext;
use crate::tools::registry::TypedTool;

/// Arguments for the write tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteArgs {
    /// The absolute path to the file to write (must be absolute, not relative)
    pub file_path: String,
    /// The content to write to the file
    pub content: String,
}

/// Tool for writing files
pub struct WriteTool {
    ctx: ToolContext,
}

impl WriteTool {
    /// Create a new write tool
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl TypedTool for WriteTool {
    type Args = WriteArgs;

    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Writes a file to the local filesystem. This will overwrite existing files. Prefer the \
         edit tool for modifying existing files. Use this tool to create new files or for \
         complete rewrites."
    }

    async fn execute(&self, args: WriteArgs) -> Result<String> {
        let path = self.ctx.resolve(&args.file_path);

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return Ok(format!("Error writing file: {}", e));
            }
        }

        match tokio::fs::write(&path, args.content).await {
            Ok(()) => Ok(format!("Successfully wrote to {}", args.file_path)),
            Err(e) => Ok(format!("Error writing file: {}", e)),
        }
    }
}
