//! Glob tool
//!
//! File pattern matching, newest files first.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::{RelayError, Result};
use crate::tools::context::ToolContext;
use crate::tools::registry::TypedTool;

/// Arguments for the glob tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GlobArgs {
    /// The glob pattern to match files against
    pub pattern: String,
    /// The directory to search in. Defaults to current working directory.
    pub path: Option<String>,
}

/// Tool for finding files by pattern
pub struct GlobTool {
    ctx: ToolContext,
}

impl GlobTool {
    /// Create a new glob tool
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Walk `root` collecting files that match `pattern`, newest first.
    ///
    /// Hidden files and gitignored paths are skipped.
    fn find(root: &Path, pattern: &str) -> std::result::Result<Vec<PathBuf>, ignore::Error> {
        let overrides = OverrideBuilder::new(root)
            .add(&anchor_pattern(pattern))?
            .build()?;

        let mut files: Vec<(PathBuf, SystemTime)> = WalkBuilder::new(root)
            .overrides(overrides)
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| {
                let mtime = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (entry.into_path(), mtime)
            })
            .collect();

        files.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(files.into_iter().map(|(path, _)| path).collect())
    }
}

/// Root a slash-free pattern at the search directory.
///
/// Gitignore syntax lets `*.rs` match at any depth; a glob means top level only.
fn anchor_pattern(pattern: &str) -> String {
    if pattern.contains('/') || pattern.starts_with('!') {
        pattern.to_string()
    } else {
        format!("/{}", pattern)
    }
}

#[async_trait]
impl TypedTool for GlobTool {
    type Args = GlobArgs;

    fn name(&self) -> &str {
        "glob"
    }

    fn description(&self) -> &str {
        "Fast file pattern matching tool that works with any codebase size. Supports glob \
         patterns like \"**/*.js\" or \"src/**/*.ts\"; a pattern without \"/\" such as \"*.js\" \
         only matches the top level of the search directory. Returns matching file paths sorted \
         by modification time."
    }

    async fn execute(&self, args: GlobArgs) -> Result<String> {
        let root = match args.path {
            Some(ref p) => self.ctx.resolve(p),
            None => self.ctx.working_dir.clone(),
        };

        if !root.is_dir() {
            return Ok(format!("Error during glob: {} is not a directory", root.display()));
        }

        let pattern = args.pattern.clone();
        let found = tokio::task::spawn_blocking(move || Self::find(&root, &pattern))
            .await
            .map_err(|e| RelayError::tool(format!("glob task failed: {}", e)))?;

        match found {
            Ok(files) if files.is_empty() => Ok("No files matched the pattern.".to_string()),
            Ok(files) => Ok(files
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            Err(e) => Ok(format!("Error during glob: {}", e)),
        }
    }
}
