//! Bash tool
//!
//! Runs shell commands with a bounded execution time. The working directory
//! persists between calls on the same instance.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::{RelayError, Result};
use crate::tools::context::ToolContext;
use crate::tools::registry::{Tool, TypedTool};

/// Line the wrapper script prints so the tool can follow `cd`
const CWD_MARKER: &str = "__RELAY_CWD__:";

/// Arguments for the bash tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct BashArgs {
    /// The command to execute
    pub command: String,
    /// Optional timeout in milliseconds (max 600000)
    pub timeout: Option<u64>,
    /// Clear, concise description of what this command does
    pub description: Option<String>,
}

/// Tool for running shell commands
pub struct BashTool {
    ctx: ToolContext,
    cwd: Mutex<PathBuf>,
}

impl BashTool {
    /// Create a bash tool starting in the context's working directory
    pub fn new(ctx: ToolContext) -> Self {
        let cwd = Mutex::new(ctx.working_dir.clone());
        Self { ctx, cwd }
    }

    /// Current working directory of this instance
    pub async fn cwd(&self) -> PathBuf {
        self.cwd.lock().await.clone()
    }

    fn shell() -> String {
        std::env::var("SHELL")
            .ok()
            .filter(|s| s.ends_with("bash") || s.ends_with("zsh"))
            .unwrap_or_else(|| "/bin/bash".to_string())
    }

    /// Wrap a command so its final directory is reported without changing its exit status
    fn wrap(command: &str) -> String {
        format!(
            "{}\n__relay_status=$?\nprintf '\\n{}%s\\n' \"$PWD\"\nexit $__relay_status",
            command, CWD_MARKER
        )
    }

    /// Split the directory report off captured stdout
    fn take_cwd(stdout: &str) -> (String, Option<PathBuf>) {
        match stdout.rfind(CWD_MARKER) {
            Some(pos) => {
                let dir = stdout[pos + CWD_MARKER.len()..].trim_end_matches('\n');
                let body = stdout[..pos].strip_suffix('\n').unwrap_or(&stdout[..pos]);
                (body.to_string(), Some(PathBuf::from(dir)))
            }
            None => (stdout.to_string(), None),
        }
    }
}

#[async_trait]
impl TypedTool for BashTool {
    type Args = BashArgs;

    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Executes a given bash command and returns its output. The working directory persists \
         between commands. Use this for running shell commands, git operations, build scripts, \
         etc. Avoid using it for file operations (read, write, edit, search); use the dedicated \
         tools instead."
    }

    async fn execute(&self, args: BashArgs) -> Result<String> {
        let timeout_ms = args
            .timeout
            .unwrap_or(self.ctx.bash_timeout_ms)
            .min(self.ctx.max_bash_timeout_ms);
        let cwd = self.cwd().await;

        debug!(
            command = %args.command,
            description = args.description.as_deref().unwrap_or(""),
            cwd = %cwd.display(),
            timeout_ms,
            "Running shell command"
        );

        let child = Command::new(Self::shell())
            .arg("-c")
            .arg(Self::wrap(&args.command))
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RelayError::tool(format!("Failed to start shell: {}", e)))?;

        // Dropping the future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            child.wait_with_output(),
        )
        .await
        {
            Ok(output) => output?,
            Err(_) => {
                return Ok(format!(
                    "Error: Command timed out after {} ms: {}",
                    timeout_ms, args.command
                ))
            }
        };

        let (stdout, new_cwd) = Self::take_cwd(&self.ctx.truncate_output(&output.stdout));
        if let Some(dir) = new_cwd.filter(|d| d.is_dir()) {
            *self.cwd.lock().await = dir;
        }

        if output.status.success() {
            if stdout.is_empty() {
                Ok("(no output)".to_string())
            } else {
                Ok(stdout)
            }
        } else {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Ok(format!(
                "Command failed with exit code {}\nstdout: {}\nstderr: {}",
                code,
                stdout,
                self.ctx.truncate_output(&output.stderr)
            ))
        }
    }

    fn fork(&self) -> Option<Arc<dyn Tool>> {
        Some(Arc::new(Self::new(self.ctx.clone())))
    }
}
