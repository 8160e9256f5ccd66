//! Grep tool
//!
//! Content search through the ripgrep (`rg`) binary.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::process::Command;

use crate::core::Result;
use crate::tools::context::ToolContext;
use crate::tools::registry::TypedTool;

const GREP_TIMEOUT: Duration = Duration::from_secs(30);

/// Output shape for grep results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Matching lines
    Content,
    /// Paths of matching files
    #[default]
    FilesWithMatches,
    /// Match counts per file
    Count,
}

/// Arguments for the grep tool
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GrepArgs {
    /// The regular expression pattern to search for in file contents
    pub pattern: String,
    /// File or directory to search in. Defaults to current working directory.
    pub path: Option<String>,
    /// Glob pattern to filter files (e.g. "*.js", "*.{ts,tsx}")
    pub glob: Option<String>,
    /// Output mode. Defaults to "files_with_matches".
    pub output_mode: Option<OutputMode>,
    /// Number of lines to show before each match
    #[serde(rename = "-B")]
    pub before: Option<usize>,
    /// Number of lines to show after each match
    #[serde(rename = "-A")]
    pub after: Option<usize>,
    /// Number of lines to show before and after each match
    #[serde(rename = "-C")]
    pub context: Option<usize>,
    /// Show line numbers in output. Defaults to true.
    #[serde(rename = "-n")]
    pub line_numbers: Option<bool>,
    /// Case insensitive search
    #[serde(rename = "-i")]
    pub case_insensitive: Option<bool>,
    /// File type to search (e.g. js, py, rust, go)
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    /// Limit output to first N lines/entries
    pub head_limit: Option<usize>,
    /// Skip first N lines/entries before applying head_limit
    pub offset: Option<usize>,
    /// Enable multiline mode where patterns can span lines. Default: false.
    pub multiline: Option<bool>,
}

/// Tool for searching file contents
pub struct GrepTool {
    ctx: ToolContext,
}

impl GrepTool {
    /// Create a new grep tool
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Translate arguments into an `rg` command line
    fn build_args(args: &GrepArgs) -> Vec<String> {
        let mode = args.output_mode.unwrap_or_default();
        let mut rg = Vec::new();

        match mode {
            OutputMode::FilesWithMatches => rg.push("-l".to_string()),
            OutputMode::Count => rg.push("-c".to_string()),
            OutputMode::Content => {
                if args.line_numbers != Some(false) {
                    rg.push("-n".to_string());
                }
                for (flag, value) in [("-C", args.context), ("-B", args.before), ("-A", args.after)] {
                    if let Some(n) = value {
                        rg.push(flag.to_string());
                        rg.push(n.to_string());
                    }
                }
            }
        }

        if args.case_insensitive == Some(true) {
            rg.push("-i".to_string());
        }
        if args.multiline == Some(true) {
            rg.push("-U".to_string());
            rg.push("--multiline-dotall".to_string());
        }
        if let Some(ref t) = args.file_type {
            rg.push("--type".to_string());
            rg.push(t.clone());
        }
        if let Some(ref g) = args.glob {
            rg.push("--glob".to_string());
            rg.push(g.clone());
        }

        rg.push("-e".to_string());
        rg.push(args.pattern.clone());
        rg.push(args.path.clone().unwrap_or_else(|| ".".to_string()));
        rg
    }

    /// Apply `offset` and `head_limit` to output lines
    fn slice(output: &str, offset: Option<usize>, head_limit: Option<usize>) -> String {
        let offset = offset.unwrap_or(0);
        match head_limit.filter(|n| *n > 0) {
            Some(limit) => output
                .lines()
                .skip(offset)
                .take(limit)
                .collect::<Vec<_>>()
                .join("\n"),
            None if offset > 0 => output.lines().skip(offset).collect::<Vec<_>>().join("\n"),
            None => output.to_string(),
        }
    }
}

#[async_trait]
impl TypedTool for GrepTool {
    type Args = GrepArgs;

    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "A powerful search tool built on ripgrep. Supports full regex syntax, file type \
         filtering, glob patterns, and multiple output modes. Use output_mode \"content\" for \
         matching lines, \"files_with_matches\" for file paths, \"count\" for match counts."
    }

    async fn execute(&self, args: GrepArgs) -> Result<String> {
        let child = Command::new("rg")
            .args(Self::build_args(&args))
            .current_dir(&self.ctx.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok("Error during grep: ripgrep (rg) is not installed".to_string())
            }
            Err(e) => return Ok(format!("Error during grep: {}", e)),
        };

        let output = match tokio::time::timeout(GREP_TIMEOUT, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => return Ok("Error during grep: search timed out".to_string()),
        };

        match output.status.code() {
            Some(0) => {
                let text = self.ctx.truncate_output(&output.stdout);
                let sliced = Self::slice(text.trim(), args.offset, args.head_limit);
                if sliced.is_empty() {
                    Ok("No matches found.".to_string())
                } else {
                    Ok(sliced)
                }
            }
            Some(1) => Ok("No matches found.".to_string()),
            _ => Ok(format!(
                "Error during grep: {}",
                self.ctx.truncate_output(&output.stderr).trim()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_args_defaults() {
        let args: GrepArgs = serde_json::from_value(json!({"pattern": "fn main"})).unwrap();
        assert_eq!(GrepTool::build_args(&args), vec!["-l", "-e", "fn main", "."]);
    }

    #[test]
    fn test_build_args_content_mode() {
        let args: GrepArgs = serde_json::from_value(json!({
            "pattern": "todo",
            "path": "src",
            "output_mode": "content",
            "-C": 2,
            "-i": true,
            "type": "rust",
            "glob": "*.rs"
        }))
        .unwrap();

        assert_eq!(
            GrepTool::build_args(&args),
            vec![
                "-n", "-C", "2", "-i", "--type", "rust", "--glob", "*.rs", "-e", "todo", "src"
            ]
        );
    }

    #[test]
    fn test_slice() {
        let text = "a\nb\nc\nd";
        assert_eq!(GrepTool::slice(text, None, Some(2)), "a\nb");
        assert_eq!(GrepTool::slice(text, Some(1), Some(2)), "b\nc");
        assert_eq!(GrepTool::slice(text, Some(3), None), "d");
        assert_eq!(GrepTool::slice(text, None, None), text);
    }

    #[test]
    fn test_schema_uses_flag_names() {
        use crate::tools::registry::Tool;
        let schema = GrepTool::new(ToolContext::new(".")).input_schema();
        assert!(schema["properties"]["-B"].is_object());
        assert!(schema["properties"]["type"].is_object());
        assert_eq!(schema["required"], json!(["pattern"]));
    }
}
