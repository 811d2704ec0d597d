//! System tools: allowlisted read-only command execution and host queries

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use toolgate_domain::{
    Domain, OutcomeMetadata, ParamType, ToolCall, ToolDefinition, ToolError, ToolOutcome,
    ToolParameter,
};

use crate::provider::ToolProvider;

pub const EXEC_RO: &str = "system.exec_ro";
pub const OS_INFO: &str = "system.os_info";
pub const OPEN_PATH: &str = "system.open_path";

/// Commands `system.exec_ro` will run. Nothing here mutates files.
const ALLOWED_COMMANDS: [&str; 7] = ["ls", "cat", "rg", "git", "head", "tail", "wc"];

const EXEC_TIMEOUT_SECS: u64 = 5;

/// Host-level tools rooted at one workspace.
pub struct SystemProvider {
    workspace: PathBuf,
}

impl SystemProvider {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl ToolProvider for SystemProvider {
    fn id(&self) -> &str {
        "system"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                EXEC_RO,
                format!(
                    "Run a read-only command. Allowed commands: {}",
                    ALLOWED_COMMANDS.join(", ")
                ),
                Domain::System,
            )
            .with_parameter(ToolParameter::new(
                "command",
                "Command line to run (no shell; arguments split on whitespace)",
                true,
            ))
            .with_timeout_secs(EXEC_TIMEOUT_SECS),
            ToolDefinition::new(OS_INFO, "Show operating system information", Domain::System),
            ToolDefinition::new(
                OPEN_PATH,
                "Open a file or directory with the system launcher",
                Domain::System,
            )
            .with_parameter(
                ToolParameter::new("path", "Path to open", true).with_type(ParamType::Path),
            ),
        ]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match call.name.as_str() {
            EXEC_RO => execute_exec_ro(&self.workspace, call).await,
            OS_INFO => execute_os_info(),
            OPEN_PATH => execute_open_path(call),
            other => ToolOutcome::failure(other, ToolError::unknown_tool(other)),
        }
    }
}

pub async fn execute_exec_ro(workspace: &Path, call: &ToolCall) -> ToolOutcome {
    let start = Instant::now();

    let command_line = match call.require_string("command") {
        Ok(c) => c,
        Err(e) => return ToolOutcome::failure(EXEC_RO, ToolError::invalid_argument(e)),
    };

    let mut parts = command_line.split_whitespace();
    let Some(program) = parts.next() else {
        return ToolOutcome::failure(EXEC_RO, ToolError::invalid_argument("'command' is empty"));
    };
    if !ALLOWED_COMMANDS.contains(&program) {
        return ToolOutcome::failure(
            EXEC_RO,
            ToolError::execution_failed(format!(
                "Command '{}' is not on the read-only allowlist ({})",
                program,
                ALLOWED_COMMANDS.join(", ")
            )),
        );
    }
    let args: Vec<&str> = parts.collect();

    let output = match Command::new(program)
        .args(&args)
        .current_dir(workspace)
        .kill_on_drop(true)
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            return ToolOutcome::failure(
                EXEC_RO,
                ToolError::execution_failed(format!("Failed to run '{program}': {e}")),
            );
        }
    };

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    // Non-zero exits are reported, not raised. `rg` without matches exits 1.
    let mut text = stdout.trim_end().to_string();
    if !stderr.trim().is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str("--- stderr ---\n");
        text.push_str(stderr.trim_end());
    }
    if text.is_empty() {
        text = format!("(no output, exit code {exit_code})");
    }

    ToolOutcome::success(EXEC_RO, text).with_metadata(OutcomeMetadata {
        duration_ms: Some(start.elapsed().as_millis() as u64),
        exit_code: Some(exit_code),
        ..Default::default()
    })
}

pub fn execute_os_info() -> ToolOutcome {
    let mut lines = vec![
        format!("OS: {}", std::env::consts::OS),
        format!("Architecture: {}", std::env::consts::ARCH),
        format!("Family: {}", std::env::consts::FAMILY),
    ];
    if let Ok(hostname) = std::env::var("HOSTNAME") {
        lines.push(format!("Hostname: {hostname}"));
    }
    ToolOutcome::success(OS_INFO, lines.join("\n"))
}

pub fn execute_open_path(call: &ToolCall) -> ToolOutcome {
    let path_str = match call.require_string("path") {
        Ok(p) => p,
        Err(e) => return ToolOutcome::failure(OPEN_PATH, ToolError::invalid_argument(e)),
    };
    if !Path::new(path_str).exists() {
        return ToolOutcome::failure(OPEN_PATH, ToolError::not_found(path_str));
    }

    let launcher = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    if which::which(launcher).is_err() {
        return ToolOutcome::failure(
            OPEN_PATH,
            ToolError::execution_failed(format!("'{launcher}' is not available on this system")),
        );
    }

    match std::process::Command::new(launcher)
        .arg(path_str)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
    {
        Ok(_) => ToolOutcome::success(OPEN_PATH, format!("Opened {path_str} with {launcher}"))
            .with_metadata(OutcomeMetadata {
                path: Some(path_str.to_string()),
                ..Default::default()
            }),
        Err(e) => ToolOutcome::failure(
            OPEN_PATH,
            ToolError::execution_failed(format!("Failed to launch '{launcher}': {e}")),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_exec_ro_runs_an_allowlisted_command() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("visible.txt"), "x").unwrap();

        let call = ToolCall::new(EXEC_RO).with_arg("command", "ls");
        let outcome = execute_exec_ro(dir.path(), &call).await;

        assert!(outcome.is_success());
        assert!(outcome.output().unwrap().contains("visible.txt"));
        assert_eq!(outcome.metadata.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_exec_ro_rejects_commands_off_the_allowlist() {
        let dir = tempdir().unwrap();

        let call = ToolCall::new(EXEC_RO).with_arg("command", "rm -rf /tmp/x");
        let outcome = execute_exec_ro(dir.path(), &call).await;

        assert!(!outcome.is_success());
        let error = outcome.error().unwrap();
        assert_eq!(error.code, "EXECUTION_FAILED");
        assert!(error.message.contains("allowlist"));
    }

    #[tokio::test]
    async fn test_exec_ro_empty_command() {
        let dir = tempdir().unwrap();

        let call = ToolCall::new(EXEC_RO).with_arg("command", "   ");
        let outcome = execute_exec_ro(dir.path(), &call).await;

        assert_eq!(outcome.error().unwrap().code, "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_exec_ro_reports_nonzero_exits_as_output() {
        let dir = tempdir().unwrap();

        let call = ToolCall::new(EXEC_RO).with_arg("command", "cat definitely-missing.txt");
        let outcome = execute_exec_ro(dir.path(), &call).await;

        assert!(outcome.is_success());
        assert!(outcome.output().unwrap().contains("--- stderr ---"));
        assert_ne!(outcome.metadata.exit_code, Some(0));
    }

    #[test]
    fn test_os_info_reports_the_platform() {
        let outcome = execute_os_info();

        assert!(outcome.is_success());
        let output = outcome.output().unwrap();
        assert!(output.contains(&format!("OS: {}", std::env::consts::OS)));
        assert!(output.contains("Architecture:"));
    }

    #[test]
    fn test_open_path_missing_target() {
        let call = ToolCall::new(OPEN_PATH).with_arg("path", "/no/such/target");
        let outcome = execute_open_path(&call);

        assert_eq!(outcome.error().unwrap().code, "NOT_FOUND");
    }
}
