//! Project-root sandbox for file tools.
//!
//! Every path a tool receives is relative to a fixed project root.
//! Absolute paths and `..` components are rejected before any I/O.

use codeloop_core::error::ToolError;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectRoot {
    root: PathBuf,
}

impl ProjectRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve a model-supplied relative path inside the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ToolError> {
        if relative.trim().is_empty() {
            return Err(ToolError::SandboxViolation("empty path".into()));
        }

        // Backslashes count as separators regardless of platform.
        let normalized = relative.replace('\\', "/");
        if normalized.split('/').any(|part| part == "..") {
            return Err(ToolError::SandboxViolation(format!(
                "path traversal detected in '{relative}'"
            )));
        }

        let candidate = Path::new(&normalized);
        for component in candidate.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(ToolError::SandboxViolation(format!(
                        "path traversal detected in '{relative}'"
                    )));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(ToolError::SandboxViolation(format!(
                        "absolute path '{relative}' is outside the project root"
                    )));
                }
            }
        }

        Ok(self.root.join(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> ProjectRoot {
        ProjectRoot::new("/work/project")
    }

    #[test]
    fn relative_paths_join_root() {
        let resolved = root().resolve("src/main.rs").unwrap();
        assert_eq!(resolved, PathBuf::from("/work/project/src/main.rs"));
    }

    #[test]
    fn current_dir_components_allowed() {
        assert!(root().resolve("./README.md").is_ok());
    }

    #[test]
    fn absolute_paths_rejected() {
        let err = root().resolve("/etc/passwd").unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation(_)));
    }

    #[test]
    fn traversal_rejected() {
        for path in ["../secret", "src/../../x", "..", "a\\..\\b"] {
            let err = root().resolve(path).unwrap_err();
            assert!(matches!(err, ToolError::SandboxViolation(_)), "{path}");
        }
    }

    #[test]
    fn dotted_names_are_not_traversal() {
        assert!(root().resolve("notes..txt").is_ok());
        assert!(root().resolve("..hidden/file").is_ok());
    }

    #[test]
    fn empty_path_rejected() {
        assert!(root().resolve("  ").is_err());
    }
}
