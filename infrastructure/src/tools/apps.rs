//! Application tools: launch desktop applications by name

use async_trait::async_trait;

use toolgate_domain::{Domain, ToolCall, ToolDefinition, ToolError, ToolOutcome, ToolParameter};

use crate::provider::ToolProvider;

pub const OPEN: &str = "apps.open";

/// Desktop application launcher.
pub struct AppsProvider;

impl AppsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AppsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolProvider for AppsProvider {
    fn id(&self) -> &str {
        "apps"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(OPEN, "Open an application by name", Domain::Apps).with_parameter(
                ToolParameter::new("name", "Application name (e.g. 'firefox')", true),
            ),
        ]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match call.name.as_str() {
            OPEN => execute_open(call),
            other => ToolOutcome::failure(other, ToolError::unknown_tool(other)),
        }
    }
}

pub fn execute_open(call: &ToolCall) -> ToolOutcome {
    let name = match call.require_string("name") {
        Ok(n) => n.trim(),
        Err(e) => return ToolOutcome::failure(OPEN, ToolError::invalid_argument(e)),
    };
    if name.is_empty() || name.starts_with('-') {
        return ToolOutcome::failure(
            OPEN,
            ToolError::invalid_argument(format!("Invalid application name: '{name}'")),
        );
    }

    let (program, args) = match launcher_for(name) {
        Ok(launcher) => launcher,
        Err(e) => return ToolOutcome::failure(OPEN, e),
    };

    match std::process::Command::new(&program)
        .args(&args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
    {
        Ok(_) => ToolOutcome::success(OPEN, format!("Launched '{name}'")),
        Err(e) => ToolOutcome::failure(
            OPEN,
            ToolError::execution_failed(format!("Failed to launch '{name}': {e}")),
        ),
    }
}

/// Resolve the platform launcher for an application name.
fn launcher_for(name: &str) -> Result<(String, Vec<String>), ToolError> {
    if cfg!(target_os = "macos") {
        return Ok(("open".to_string(), vec!["-a".to_string(), name.to_string()]));
    }
    if cfg!(target_os = "windows") {
        return Ok((
            "cmd".to_string(),
            vec!["/C".to_string(), "start".to_string(), name.to_string()],
        ));
    }
    // Linux: prefer the binary itself, fall back to gtk-launch for .desktop apps
    if let Ok(path) = which::which(name) {
        return Ok((path.display().to_string(), Vec::new()));
    }
    if which::which("gtk-launch").is_ok() {
        return Ok(("gtk-launch".to_string(), vec![name.to_string()]));
    }
    Err(ToolError::execution_failed(format!(
        "No launcher found for '{name}' (not in PATH, and gtk-launch is unavailable)"
    )))
}
