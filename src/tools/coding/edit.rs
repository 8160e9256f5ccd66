//! Edit file tool
//!
//! Exact string replacement inside an existing file.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::Result;
use crate::tools::context::ToolContext;
use crate::tools::registry::TypedTool;

/// Arguments for the edit tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditArgs {
    /// The absolute path to the file to modify
    pub file_path: String,
    /// The text to replace
    pub old_string: String,
    /// The text to replace it with (must be different from old_string)
    pub new_string: String,
    /// Replace all occurrences of old_string (default false)
    #[serde(default)]
    pub replace_all: bool,
}

/// Tool for editing files
pub struct EditTool {
    ctx: ToolContext,
}

impl EditTool {
    /// Create a new edit tool
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Apply the replacement, or describe why it cannot be applied
    fn apply(content: &str, args: &EditArgs) -> std::result::Result<String, String> {
        if !content.contains(&args.old_string) {
            return Err("Error: old_string not found in file. Make sure the string matches \
                        exactly, including whitespace and indentation."
                .to_string());
        }

        if args.old_string == args.new_string {
            return Err(
                "Error: old_string and new_string are identical. No changes made.".to_string(),
            );
        }

        if args.replace_all {
            return Ok(content.replace(&args.old_string, &args.new_string));
        }

        let occurrences = content.matches(&args.old_string).count();
        if occurrences > 1 {
            return Err(format!(
                "Error: old_string appears {} times in the file. Provide more context to make \
                 it unique, or use replace_all to replace all occurrences.",
                occurrences
            ));
        }

        Ok(content.replacen(&args.old_string, &args.new_string, 1))
    }
}

#[async_trait]
impl TypedTool for EditTool {
    type Args = EditArgs;

    fn name(&self) -> &str {
        "edit"
    }

    fn description(&self) -> &str {
        "Performs exact string replacements in files. The old_string must match exactly \
         (including whitespace/indentation). The edit will fail if old_string is not unique; \
         provide more context or use replace_all. Always prefer editing over writing entire files."
    }

    async fn execute(&self, args: EditArgs) -> Result<String> {
        let path = self.ctx.resolve(&args.file_path);

        if !path.is_file() {
            return Ok(format!("Error: File not found: {}", args.file_path));
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) => return Ok(format!("Error editing file: {}", e)),
        };

        let updated = match Self::apply(&content, &args) {
            Ok(updated) => updated,
            Err(message) => return Ok(message),
        };

        match tokio::fs::write(&path, updated).await {
            Ok(()) => Ok(format!("Successfully edited {}", args.file_path)),
            Err(e) => Ok(format!("Error editing file: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(old: &str, new: &str, replace_all: bool) -> EditArgs {
        EditArgs {
            file_path: "f.txt".to_string(),
            old_string: old.to_string(),
            new_string: new.to_string(),
            replace_all,
        }
    }

    #[test]
    fn test_apply_rules() {
        assert_eq!(EditTool::apply("a b c", &args("b", "x", false)).unwrap(), "a x c");
        assert!(EditTool::apply("a b c", &args("z", "x", false))
            .unwrap_err()
            .contains("not found"));
        assert!(EditTool::apply("a b c", &args("b", "b", false))
            .unwrap_err()
            .contains("identical"));
        assert!(EditTool::apply("b b", &args("b", "x", false))
            .unwrap_err()
            .contains("appears 2 times"));
        assert_eq!(EditTool::apply("b b", &args("b", "x", true)).unwrap(), "x x");
    }

    #[tokio::test]
    async fn test_edit_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "fn main() {}\n").unwrap();
        let tool = EditTool::new(ToolContext::new(dir.path()));

        let output = tool.execute(args("main", "start", false)).await.unwrap();
        assert_eq!(output, "Successfully edited f.txt");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "fn start() {}\n"
        );
    }

    #[tokio::test]
    async fn test_edit_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = EditTool::new(ToolContext::new(dir.path()));
        let output = tool.execute(args("a", "b", false)).await.unwrap();
        assert_eq!(output, "Error: File not found: f.txt");
    }
}
