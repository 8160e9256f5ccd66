//! Tool context - settings injected into concrete tools
//!
//! Each tool gets its own copy; nothing here is read from process-wide state
//! after construction.

use std::path::{Path, PathBuf};

use crate::core::Config;

/// Settings shared by the filesystem and shell tools
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory relative paths resolve against
    pub working_dir: PathBuf,
    /// Default shell timeout in milliseconds
    pub bash_timeout_ms: u64,
    /// Upper bound for a requested shell timeout
    pub max_bash_timeout_ms: u64,
    /// Maximum captured bytes per output stream
    pub max_output_bytes: usize,
}

impl ToolContext {
    /// Create a context rooted at `working_dir` with default limits
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        let defaults = crate::core::config::ToolsConfig::default();
        Self {
            working_dir: working_dir.into(),
            bash_timeout_ms: defaults.bash_timeout_ms,
            max_bash_timeout_ms: defaults.max_bash_timeout_ms,
            max_output_bytes: defaults.max_output_bytes,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            working_dir: config.working_dir(),
            bash_timeout_ms: config.tools.bash_timeout_ms,
            max_bash_timeout_ms: config.tools.max_bash_timeout_ms,
            max_output_bytes: config.tools.max_output_bytes,
        }
    }

    /// Resolve a possibly relative path against the working directory
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Lossily decode captured output, cut at the byte limit
    pub fn truncate_output(&self, bytes: &[u8]) -> String {
        let text = String::from_utf8_lossy(bytes);
        if text.len() <= self.max_output_bytes {
            return text.into_owned();
        }

        let mut end = self.max_output_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}\n... (output truncated)", &text[..end])
    }
}
