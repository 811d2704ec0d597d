//! Engine error types
//!
//! [`StepError`] covers everything that can reject a tool call before its
//! handler runs. These never abort a session: the step executor converts
//! them into failed trace records the model can react to. Catalog
//! construction problems ([`CatalogError`]) are startup failures and do
//! propagate.

use crate::tool::outcome::ToolError;
use thiserror::Error;

/// Rejection of one proposed tool call, raised before the handler runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("tool '{name}' is not visible (active domain: {active})")]
    ToolNotActive { name: String, active: String },

    #[error("invalid arguments for '{name}': {reason}")]
    InvalidArguments { name: String, reason: String },

    #[error("path '{path}' escapes the workspace root '{root}'")]
    SafetyViolation { path: String, root: String },
}

impl StepError {
    /// Stable code for trace payloads.
    pub fn code(&self) -> &'static str {
        match self {
            StepError::UnknownTool { .. } => "UNKNOWN_TOOL",
            StepError::ToolNotActive { .. } => "TOOL_NOT_ACTIVE",
            StepError::InvalidArguments { .. } => "INVALID_ARGUMENT",
            StepError::SafetyViolation { .. } => "SAFETY_VIOLATION",
        }
    }

    /// Convert into the coded error form carried by outcomes and records.
    pub fn into_tool_error(self) -> ToolError {
        let message = self.to_string();
        ToolError::new(self.code(), message)
    }
}

/// Failure while building the tool catalog at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate tool: {name}")]
    DuplicateTool { name: String },

    #[error("alias '{alias}' collides with an existing tool or alias")]
    DuplicateAlias { alias: String },

    #[error("alias '{alias}' targets unknown tool '{canonical}'")]
    UnknownAliasTarget { alias: String, canonical: String },
}
