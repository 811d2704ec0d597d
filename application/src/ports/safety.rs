//! Safety boundary port
//!
//! The single choke point every path-bearing tool call passes through
//! before its handler runs. Handlers never re-validate paths on their own.

use std::collections::HashMap;
use toolgate_domain::{StepError, ToolDefinition};

/// Port for authorizing a call's arguments against the workspace policy.
///
/// Implementations inspect the parameters the definition declares as
/// path-typed, resolve each to an absolute symlink-free form, and verify it
/// stays inside the configured workspace root. The vetted arguments replace
/// the raw ones handed to the handler.
pub trait SafetyPolicy: Send + Sync {
    fn authorize(
        &self,
        tool: &ToolDefinition,
        arguments: HashMap<String, serde_json::Value>,
    ) -> Result<HashMap<String, serde_json::Value>, StepError>;
}
