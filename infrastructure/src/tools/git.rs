//! Git tools: read-only queries against the workspace repository
//!
//! Every tool shells out to `git` in the workspace root. Non-zero exits
//! surface as execution failures carrying stderr, so the model sees why
//! a revision or repository was rejected.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use toolgate_domain::{
    Domain, OutcomeMetadata, ParamType, ToolCall, ToolDefinition, ToolError, ToolOutcome,
    ToolParameter,
};

use crate::provider::ToolProvider;

pub const STATUS: &str = "git.status";
pub const DIFF: &str = "git.diff";
pub const LOG: &str = "git.log";
pub const SHOW: &str = "git.show";
pub const CURRENT_BRANCH: &str = "git.current_branch";

const GIT_TIMEOUT_SECS: u64 = 10;

/// Default number of commits for `git.log`.
const DEFAULT_LOG_COUNT: i64 = 20;

/// Read-only git queries rooted at one workspace.
pub struct GitProvider {
    workspace: PathBuf,
}

impl GitProvider {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl ToolProvider for GitProvider {
    fn id(&self) -> &str {
        "git"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(STATUS, "Show the working tree status", Domain::Git)
                .with_timeout_secs(GIT_TIMEOUT_SECS),
            ToolDefinition::new(DIFF, "Show uncommitted changes", Domain::Git)
                .with_parameter(
                    ToolParameter::new("staged", "Show staged changes instead of unstaged", false)
                        .with_type(ParamType::Boolean),
                )
                .with_timeout_secs(GIT_TIMEOUT_SECS),
            ToolDefinition::new(LOG, "Show recent commits", Domain::Git)
                .with_parameter(
                    ToolParameter::new(
                        "max_count",
                        "Number of commits to show (default: 20)",
                        false,
                    )
                    .with_type(ParamType::Integer),
                )
                .with_timeout_secs(GIT_TIMEOUT_SECS),
            ToolDefinition::new(SHOW, "Show a commit with its diff", Domain::Git)
                .with_parameter(ToolParameter::new(
                    "rev",
                    "Revision to show (default: HEAD)",
                    false,
                ))
                .with_timeout_secs(GIT_TIMEOUT_SECS),
            ToolDefinition::new(CURRENT_BRANCH, "Show the checked-out branch name", Domain::Git)
                .with_timeout_secs(GIT_TIMEOUT_SECS),
        ]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match call.name.as_str() {
            STATUS => run_git(&self.workspace, STATUS, &["status", "--porcelain"]).await,
            DIFF => execute_diff(&self.workspace, call).await,
            LOG => execute_log(&self.workspace, call).await,
            SHOW => execute_show(&self.workspace, call).await,
            CURRENT_BRANCH => {
                run_git(
                    &self.workspace,
                    CURRENT_BRANCH,
                    &["rev-parse", "--abbrev-ref", "HEAD"],
                )
                .await
            }
            other => ToolOutcome::failure(other, ToolError::unknown_tool(other)),
        }
    }
}

pub async fn execute_diff(workspace: &Path, call: &ToolCall) -> ToolOutcome {
    let staged = call.get_bool("staged").unwrap_or(false);
    let mut args = vec!["diff", "--unified=2"];
    if staged {
        args.insert(1, "--cached");
    }
    run_git(workspace, DIFF, &args).await
}

pub async fn execute_log(workspace: &Path, call: &ToolCall) -> ToolOutcome {
    let max_count = call.get_i64("max_count").unwrap_or(DEFAULT_LOG_COUNT).max(1);
    let count_arg = format!("--max-count={max_count}");
    run_git(workspace, LOG, &["log", "--oneline", &count_arg]).await
}

pub async fn execute_show(workspace: &Path, call: &ToolCall) -> ToolOutcome {
    let rev = call.get_string("rev").unwrap_or("HEAD");
    // refuse option-shaped revisions so arguments cannot turn into flags
    if rev.starts_with('-') {
        return ToolOutcome::failure(
            SHOW,
            ToolError::invalid_argument(format!("Invalid revision: '{rev}'")),
        );
    }
    run_git(workspace, SHOW, &["show", rev]).await
}

async fn run_git(workspace: &Path, tool: &str, args: &[&str]) -> ToolOutcome {
    let start = Instant::now();

    let output = match Command::new("git")
        .args(args)
        .current_dir(workspace)
        .kill_on_drop(true)
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            return ToolOutcome::failure(
                tool,
                ToolError::execution_failed(format!("Failed to run git: {e}")),
            );
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let exit_code = output.status.code().unwrap_or(-1);
    let metadata = OutcomeMetadata {
        duration_ms: Some(duration_ms),
        exit_code: Some(exit_code),
        ..Default::default()
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        let message = if detail.is_empty() {
            format!("git exited with status {exit_code}")
        } else {
            detail.to_string()
        };
        return ToolOutcome::failure(tool, ToolError::execution_failed(message))
            .with_metadata(metadata);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = stdout.trim_end();
    let output_text = if text.is_empty() {
        "(no output)".to_string()
    } else {
        text.to_string()
    };

    ToolOutcome::success(tool, output_text).with_metadata(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command as StdCommand;
    use tempfile::tempdir;

    fn init_repo(dir: &Path) {
        let run = |args: &[&str]| {
            let status = StdCommand::new("git")
                .args(args)
                .current_dir(dir)
                .status()
                .unwrap();
            assert!(status.success(), "git {args:?} failed");
        };
        run(&["init", "-q", "-b", "main"]);
        run(&["config", "user.email", "test@example.com"]);
        run(&["config", "user.name", "Test"]);
        fs::write(dir.join("hello.txt"), "hello\n").unwrap();
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "first commit"]);
    }

    #[tokio::test]
    async fn test_status_reports_untracked_files() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());
        fs::write(dir.path().join("new.txt"), "new\n").unwrap();

        let provider = GitProvider::new(dir.path().to_path_buf());
        let outcome = provider.execute(&ToolCall::new(STATUS)).await;

        assert!(outcome.is_success());
        assert!(outcome.output().unwrap().contains("?? new.txt"));
    }

    #[tokio::test]
    async fn test_current_branch() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());

        let provider = GitProvider::new(dir.path().to_path_buf());
        let outcome = provider.execute(&ToolCall::new(CURRENT_BRANCH)).await;

        assert_eq!(outcome.output(), Some("main"));
    }

    #[tokio::test]
    async fn test_log_shows_commit_messages() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());

        let provider = GitProvider::new(dir.path().to_path_buf());
        let outcome = provider
            .execute(&ToolCall::new(LOG).with_arg("max_count", 5i64))
            .await;

        assert!(outcome.output().unwrap().contains("first commit"));
    }

    #[tokio::test]
    async fn test_diff_staged_and_unstaged() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());
        fs::write(dir.path().join("hello.txt"), "hello\nchanged\n").unwrap();

        let unstaged = execute_diff(dir.path(), &ToolCall::new(DIFF)).await;
        assert!(unstaged.output().unwrap().contains("+changed"));

        let status = StdCommand::new("git")
            .args(["add", "."])
            .current_dir(dir.path())
            .status()
            .unwrap();
        assert!(status.success());

        let unstaged = execute_diff(dir.path(), &ToolCall::new(DIFF)).await;
        assert_eq!(unstaged.output(), Some("(no output)"));

        let staged =
            execute_diff(dir.path(), &ToolCall::new(DIFF).with_arg("staged", true)).await;
        assert!(staged.output().unwrap().contains("+changed"));
    }

    #[tokio::test]
    async fn test_unknown_revision_is_an_execution_error() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());

        let outcome =
            execute_show(dir.path(), &ToolCall::new(SHOW).with_arg("rev", "no-such-rev")).await;

        assert!(!outcome.is_success());
        let error = outcome.error().unwrap();
        assert_eq!(error.code, "EXECUTION_FAILED");
        assert!(error.message.contains("no-such-rev"));
        assert_ne!(outcome.metadata.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_option_shaped_revision_is_rejected() {
        let dir = tempdir().unwrap();
        init_repo(dir.path());

        let outcome =
            execute_show(dir.path(), &ToolCall::new(SHOW).with_arg("rev", "--exec=true")).await;

        assert_eq!(outcome.error().unwrap().code, "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_outside_a_repository_fails() {
        let dir = tempdir().unwrap();

        let provider = GitProvider::new(dir.path().to_path_buf());
        let outcome = provider.execute(&ToolCall::new(STATUS)).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.error().unwrap().code, "EXECUTION_FAILED");
    }
}
