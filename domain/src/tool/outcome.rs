//! Tool outcomes — the output side of one tool invocation
//!
//! Every handler produces a [`ToolOutcome`]: output text on success, a coded
//! [`ToolError`] on failure, plus structured [`OutcomeMetadata`] either way.
//! The step executor folds outcomes into trace records; a failed outcome is
//! shown to the model as the step result, never raised out of the session.

use serde::{Deserialize, Serialize};

/// Error that occurred while resolving or running a tool call.
///
/// The code is a stable string the model (and trace readers) can key on:
///
/// | Code | Meaning |
/// |------|---------|
/// | `UNKNOWN_TOOL` | Name not present in the catalog |
/// | `TOOL_NOT_ACTIVE` | Tool exists but its domain is not active |
/// | `INVALID_ARGUMENT` | Arguments don't match the declared schema |
/// | `SAFETY_VIOLATION` | Path argument escapes the workspace root |
/// | `EXECUTION_FAILED` | Handler-level failure (I/O, subprocess, HTTP) |
/// | `NOT_FOUND` | Resource named by the arguments does not exist |
/// | `PERMISSION_DENIED` | Access denied by the operating system |
/// | `TIMEOUT` | Handler exceeded its time budget |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "SAFETY_VIOLATION", "NOT_FOUND")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Common error constructors
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::new("UNKNOWN_TOOL", format!("Unknown tool: {}", name.into()))
    }

    pub fn not_active(name: impl Into<String>, active: impl Into<String>) -> Self {
        Self::new(
            "TOOL_NOT_ACTIVE",
            format!(
                "Tool '{}' is not visible (active domain: {})",
                name.into(),
                active.into()
            ),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }

    pub fn safety_violation(message: impl Into<String>) -> Self {
        Self::new("SAFETY_VIOLATION", message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            "NOT_FOUND",
            format!("Resource not found: {}", resource.into()),
        )
    }

    pub fn permission_denied(resource: impl Into<String>) -> Self {
        Self::new(
            "PERMISSION_DENIED",
            format!("Permission denied: {}", resource.into()),
        )
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new(
            "TIMEOUT",
            format!("Operation timed out: {}", operation.into()),
        )
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// Result of one tool invocation, carrying output or error information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Output content (for successful execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error information (for failed execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    /// Metadata about the execution
    #[serde(default)]
    pub metadata: OutcomeMetadata,
}

/// Structured metadata about one tool invocation.
///
/// Handlers populate the fields that apply: file tools set `bytes`/`path`,
/// subprocess tools set `duration_ms`/`exit_code`, search tools set
/// `match_count`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeMetadata {
    /// Duration of execution in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Number of bytes processed/returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    /// For file operations: the affected path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// For subprocess execution: exit code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// For search operations: number of matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_count: Option<usize>,
}

impl ToolOutcome {
    /// Create a successful outcome
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            output: Some(output.into()),
            error: None,
            metadata: OutcomeMetadata::default(),
        }
    }

    /// Create a failed outcome
    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: None,
            error: Some(error),
            metadata: OutcomeMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: OutcomeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.metadata.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.metadata.path = Some(path.into());
        self
    }

    pub fn with_bytes(mut self, bytes: usize) -> Self {
        self.metadata.bytes = Some(bytes);
        self
    }

    pub fn with_match_count(mut self, count: usize) -> Self {
        self.metadata.match_count = Some(count);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn error(&self) -> Option<&ToolError> {
        self.error.as_ref()
    }

    /// Text form folded into the trace and shown to the model: the raw
    /// output on success, the rendered error on failure.
    pub fn render(&self) -> String {
        if let Some(error) = &self.error {
            error.to_string()
        } else {
            self.output.clone().unwrap_or_default()
        }
    }
}
