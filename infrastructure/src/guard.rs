//! Workspace guard — the filesystem safety boundary
//!
//! Every path-typed argument passes through [`WorkspaceGuard::authorize`]
//! before a handler sees it: relative paths are anchored at the workspace
//! root, `..` segments are folded, symlinks in the existing prefix are
//! resolved, and the result must stay inside the root. Handlers then operate
//! on the vetted absolute path only, so a handler can never be tricked into
//! touching a raw model-supplied path.
//!
//! Enforcement is decided once at construction. With enforcement off the
//! guard still rewrites arguments to vetted absolute paths; it just skips
//! the containment check.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use toolgate_application::SafetyPolicy;
use toolgate_domain::{StepError, ToolDefinition};

/// Confines path arguments to one workspace root.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    root: PathBuf,
    enforce: bool,
}

impl WorkspaceGuard {
    /// The root must exist; it is canonicalized here so later containment
    /// checks compare like with like.
    pub fn new(root: impl Into<PathBuf>, enforce: bool) -> io::Result<Self> {
        let root = root.into().canonicalize()?;
        debug!(root = %root.display(), enforce, "workspace guard ready");
        Ok(Self { root, enforce })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn enforced(&self) -> bool {
        self.enforce
    }

    /// Resolve one raw path argument to a vetted absolute path.
    ///
    /// `..` is folded lexically before symlink resolution, so it can never
    /// climb through a symlink. Paths that do not exist yet (write targets)
    /// resolve through their deepest existing ancestor.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let folded = lexical_fold(&absolute);

        if let Ok(canonical) = folded.canonicalize() {
            return canonical;
        }

        // Nonexistent tail: canonicalize the deepest existing ancestor and
        // append the rest. The tail holds no `..` after the fold above.
        let mut existing = folded.clone();
        let mut tail: Vec<OsString> = Vec::new();
        while !existing.exists() {
            match (existing.file_name(), existing.parent()) {
                (Some(name), Some(parent)) => {
                    tail.push(name.to_os_string());
                    existing = parent.to_path_buf();
                }
                _ => break,
            }
        }
        let mut resolved = existing.canonicalize().unwrap_or(existing);
        for segment in tail.iter().rev() {
            resolved.push(segment);
        }
        resolved
    }
}

impl SafetyPolicy for WorkspaceGuard {
    fn authorize(
        &self,
        tool: &ToolDefinition,
        mut arguments: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, StepError> {
        for param in tool.path_parameters() {
            let Some(raw) = arguments
                .get(&param.name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
            else {
                continue;
            };

            let vetted = self.resolve(&raw);
            if self.enforce && !vetted.starts_with(&self.root) {
                warn!(
                    tool = %tool.name,
                    parameter = %param.name,
                    path = %vetted.display(),
                    "path escapes the workspace root"
                );
                return Err(StepError::SafetyViolation {
                    path: vetted.display().to_string(),
                    root: self.root.display().to_string(),
                });
            }

            arguments.insert(
                param.name.clone(),
                Value::String(vetted.to_string_lossy().into_owned()),
            );
        }
        Ok(arguments)
    }
}

/// Fold `.` and `..` components without touching the filesystem.
fn lexical_fold(path: &Path) -> PathBuf {
    let mut folded = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                folded.pop();
            }
            Component::CurDir => {}
            other => folded.push(other.as_os_str()),
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use toolgate_domain::{Domain, ParamType, ToolParameter};

    fn read_tool() -> ToolDefinition {
        ToolDefinition::new("files.read", "Read a file", Domain::Files)
            .with_parameter(ToolParameter::new("path", "File path", true).with_type(ParamType::Path))
            .with_parameter(
                ToolParameter::new("limit", "Line limit", false).with_type(ParamType::Integer),
            )
    }

    fn args(path: &str) -> HashMap<String, Value> {
        [("path".to_string(), Value::String(path.to_string()))]
            .into_iter()
            .collect()
    }

    #[test]
    fn relative_paths_resolve_under_the_root() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let guard = WorkspaceGuard::new(dir.path(), true).unwrap();

        let vetted = guard.authorize(&read_tool(), args("notes.txt")).unwrap();
        let path = vetted["path"].as_str().unwrap();
        assert!(Path::new(path).is_absolute());
        assert!(Path::new(path).starts_with(guard.root()));
        assert!(path.ends_with("notes.txt"));
    }

    #[test]
    fn dotdot_escape_is_rejected() {
        let dir = tempdir().unwrap();
        let guard = WorkspaceGuard::new(dir.path(), true).unwrap();

        let err = guard
            .authorize(&read_tool(), args("../../../etc/passwd"))
            .unwrap_err();
        assert!(matches!(err, StepError::SafetyViolation { .. }));
    }

    #[test]
    fn absolute_path_outside_is_rejected() {
        let dir = tempdir().unwrap();
        let guard = WorkspaceGuard::new(dir.path(), true).unwrap();

        let err = guard.authorize(&read_tool(), args("/etc/passwd")).unwrap_err();
        assert!(matches!(err, StepError::SafetyViolation { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_rejected() {
        let outside = tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "s").unwrap();
        let dir = tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("sneaky")).unwrap();
        let guard = WorkspaceGuard::new(dir.path(), true).unwrap();

        let err = guard
            .authorize(&read_tool(), args("sneaky/secret.txt"))
            .unwrap_err();
        assert!(matches!(err, StepError::SafetyViolation { .. }));
    }

    #[test]
    fn nonexistent_write_target_inside_is_allowed() {
        let dir = tempdir().unwrap();
        let guard = WorkspaceGuard::new(dir.path(), true).unwrap();

        let vetted = guard
            .authorize(&read_tool(), args("newdir/output.txt"))
            .unwrap();
        let path = Path::new(vetted["path"].as_str().unwrap()).to_path_buf();
        assert!(path.starts_with(guard.root()));
        assert!(path.ends_with("newdir/output.txt"));
    }

    #[test]
    fn dotdot_through_a_nonexistent_directory_cannot_escape() {
        let dir = tempdir().unwrap();
        let guard = WorkspaceGuard::new(dir.path(), true).unwrap();

        let err = guard
            .authorize(&read_tool(), args("newdir/../../outside.txt"))
            .unwrap_err();
        assert!(matches!(err, StepError::SafetyViolation { .. }));
    }

    #[test]
    fn enforcement_off_still_absolutizes() {
        let dir = tempdir().unwrap();
        let guard = WorkspaceGuard::new(dir.path(), false).unwrap();

        let vetted = guard.authorize(&read_tool(), args("/etc/passwd")).unwrap();
        assert_eq!(vetted["path"].as_str().unwrap(), "/etc/passwd");

        let vetted = guard.authorize(&read_tool(), args("notes.txt")).unwrap();
        assert!(Path::new(vetted["path"].as_str().unwrap()).is_absolute());
    }

    #[test]
    fn non_path_arguments_pass_through_untouched() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let guard = WorkspaceGuard::new(dir.path(), true).unwrap();

        let mut input = args("a.txt");
        input.insert("limit".to_string(), Value::from(40));
        let vetted = guard.authorize(&read_tool(), input).unwrap();
        assert_eq!(vetted["limit"], Value::from(40));
    }

    #[test]
    fn missing_optional_path_is_fine() {
        let dir = tempdir().unwrap();
        let guard = WorkspaceGuard::new(dir.path(), true).unwrap();

        let vetted = guard.authorize(&read_tool(), HashMap::new()).unwrap();
        assert!(vetted.is_empty());
    }

    #[test]
    fn root_must_exist() {
        assert!(WorkspaceGuard::new("/no/such/workspace/root", true).is_err());
    }
}
