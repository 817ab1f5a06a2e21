//! `file_write`: persist model output as a text file in the sandbox.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;

use super::definitions::{ParamType, ToolDeclaration};
use super::error::ToolError;
use super::registry::Tool;
use super::sandbox::ToolSandbox;

pub const FILE_WRITE_TOOL: &str = "file_write";

/// Writes `content` to `<sandbox>/<fileName>.<extension>`, overwriting.
pub struct FileWriteTool {
    sandbox: ToolSandbox,
    extension: String,
}

impl FileWriteTool {
    pub fn new(output_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            sandbox: ToolSandbox::new(output_dir),
            extension: extension.into(),
        }
    }

    /// Sandbox at `<working root>/<output_dir>`.
    pub fn under(working_root: &std::path::Path, output_dir: &str, extension: &str) -> Self {
        Self::new(working_root.join(output_dir), extension)
    }

    pub fn sandbox(&self) -> &ToolSandbox {
        &self.sandbox
    }
}

/// Models emit newlines inside string arguments as the two characters `\n`.
pub fn unescape_newlines(content: &str) -> String {
    content.replace("\\n", "\n")
}

fn required_str<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Err(ToolError::MissingParameter(name.to_string())),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ToolError::InvalidArgument {
            name: name.to_string(),
            reason: format!("expected a string, got {other}"),
        }),
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration::new(
            FILE_WRITE_TOOL,
            "write a text file to user local file system with specified name and content.",
        )
        .with_param(
            "fileName",
            ParamType::String,
            format!(
                "The name of the file to write to. Do not include extension, \
                 it will be automatically added (.{})",
                self.extension
            ),
            true,
        )
        .with_param(
            "content",
            ParamType::String,
            "The text content to write to the file",
            true,
        )
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let file_name = required_str(args, "fileName")?;
        let content = required_str(args, "content")?;

        let path = self.sandbox.resolve_file(file_name, &self.extension)?;
        let formatted = unescape_newlines(content);
        tokio::fs::write(&path, formatted.as_bytes()).await?;

        info!(path = %path.display(), bytes = formatted.len(), "file written");
        Ok(format!(
            "wrote {} bytes to {}.{}",
            formatted.len(),
            file_name.trim(),
            self.extension
        ))
    }
}
