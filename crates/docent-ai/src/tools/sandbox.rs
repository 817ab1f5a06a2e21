//! Sandbox that confines tool-written files to one directory.

use std::path::{Path, PathBuf};

use super::error::ToolError;

/// Sandbox rooted at a fixed output directory.
///
/// Every path handed out is canonicalised and checked to live under the
/// canonical root, so `..` segments and symlinks cannot escape it.
#[derive(Debug, Clone)]
pub struct ToolSandbox {
    root: PathBuf,
}

impl ToolSandbox {
    /// Create a sandbox rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root if absent and return its canonical form.
    pub fn ensure_root(&self) -> Result<PathBuf, ToolError> {
        std::fs::create_dir_all(&self.root)?;
        Ok(std::fs::canonicalize(&self.root)?)
    }

    /// Resolve `file_name` plus `extension` to a path directly inside the root.
    ///
    /// The name must be a bare file name: no separators, no `.`/`..`, not
    /// empty. The joined path is then verified with [`Self::validate_path`].
    pub fn resolve_file(&self, file_name: &str, extension: &str) -> Result<PathBuf, ToolError> {
        let name = file_name.trim();
        if name.is_empty() {
            return Err(ToolError::InvalidArgument {
                name: "fileName".into(),
                reason: "must not be empty".into(),
            });
        }
        if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
            return Err(ToolError::Sandbox(format!(
                "file name '{file_name}' must not contain path components"
            )));
        }
        if Path::new(name).is_absolute() || name.contains(':') {
            return Err(ToolError::Sandbox(format!(
                "file name '{file_name}' must be relative"
            )));
        }

        let root = self.ensure_root()?;
        self.validate_path(&root, &root.join(format!("{name}.{extension}")))
    }

    /// Validate that `path` resolves to a location inside `canonical_root`.
    ///
    /// If the path does not exist yet, the parent directory is canonicalised
    /// instead (to support file creation). Returns the resolved path.
    pub fn validate_path(&self, canonical_root: &Path, path: &Path) -> Result<PathBuf, ToolError> {
        // Fall back to the parent when the leaf doesn't exist yet.
        let canonical = match std::fs::canonicalize(path) {
            Ok(p) => p,
            Err(_) => {
                let parent = path.parent().ok_or_else(|| {
                    ToolError::Sandbox("cannot resolve parent directory".into())
                })?;
                let canon_parent = std::fs::canonicalize(parent).map_err(|e| {
                    ToolError::Sandbox(format!(
                        "cannot resolve path '{}': {e}",
                        parent.display()
                    ))
                })?;
                let file_name = path
                    .file_name()
                    .ok_or_else(|| ToolError::Sandbox("path has no file name".into()))?;
                canon_parent.join(file_name)
            }
        };

        if !canonical.starts_with(canonical_root) {
            return Err(ToolError::Sandbox(format!(
                "path '{}' is outside sandbox '{}'",
                canonical.display(),
                canonical_root.display(),
            )));
        }

        Ok(canonical)
    }
}
