//! Read file tool
//!
//! Returns file content with line numbers in `cat -n` format.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::Result;
use crate::tools::context::ToolContext;
use crate::tools::registry::TypedTool;

const DEFAULT_LIMIT: usize = 2000;
const MAX_LINE_CHARS: usize = 2000;

/// Arguments for the read tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadArgs {
    /// The absolute path to the file to read
    pub file_path: String,
    /// The line number to start reading from (1-based). Only provide for large files.
    pub offset: Option<usize>,
    /// The number of lines to read. Defaults to 2000.
    pub limit: Option<usize>,
}

/// Tool for reading files
pub struct ReadTool {
    ctx: ToolContext,
}

impl ReadTool {
    /// Create a new read tool
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    fn format_lines(content: &str, offset: Option<usize>, limit: Option<usize>) -> String {
        let start = offset.unwrap_or(1).saturating_sub(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        content
            .lines()
            .enumerate()
            .skip(start)
            .take(limit)
            .map(|(i, line)| {
                if line.chars().count() > MAX_LINE_CHARS {
                    let cut: String = line.chars().take(MAX_LINE_CHARS).collect();
                    format!("{:>6}\t{}...", i + 1, cut)
                } else {
                    format!("{:>6}\t{}", i + 1, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl TypedTool for ReadTool {
    type Args = ReadArgs;

    fn name(&self) -> &str {
        "read"
    }

    fn description(&self) -> &str {
        "Reads a file from the local filesystem. Returns content with line numbers in cat -n \
         format. By default reads up to 2000 lines. Lines longer than 2000 characters are \
         truncated. Use offset and limit for large files."
    }

    async fn execute(&self, args: ReadArgs) -> Result<String> {
        let path = self.ctx.resolve(&args.file_path);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(_) => return Ok(format!("Error: File not found: {}", args.file_path)),
        };

        if metadata.is_dir() {
            return Ok(format!(
                "Error: {} is a directory, not a file. Use bash 'ls' to list directory contents.",
                args.file_path
            ));
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) => return Ok(format!("Error reading file: {}", e)),
        };

        let formatted = Self::format_lines(&content, args.offset, args.limit);
        if formatted.is_empty() {
            Ok("(empty file)".to_string())
        } else {
            Ok(formatted)
        }
    }
}
