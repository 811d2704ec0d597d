//! Tool provider trait implemented by each domain's handler module

use async_trait::async_trait;

use toolgate_domain::{ToolCall, ToolDefinition, ToolOutcome};

/// One domain's worth of tool handlers.
///
/// A provider declares its definitions once at startup and executes calls
/// addressed to them. Calls arrive with vetted arguments: path parameters
/// have already been rewritten to absolute in-workspace paths by the safety
/// boundary, so handlers trust them.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Stable provider id, used in logs and registry routing.
    fn id(&self) -> &str;

    /// The definitions this provider contributes to the catalog.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Execute one call addressed to this provider. Failures come back as
    /// failed outcomes, never as panics or Err.
    async fn execute(&self, call: &ToolCall) -> ToolOutcome;
}
