//! Tool runtime port
//!
//! The engine's view of "everything that can actually run a tool": the
//! fixed catalog plus an invoke function. Routing a name to a concrete
//! handler is the adapter's business.

use async_trait::async_trait;
use toolgate_domain::{ToolCall, ToolCatalog, ToolOutcome};

/// Port for dispatching tool calls to their handlers.
///
/// `invoke` never returns `Err`: handler failures come back inside the
/// [`ToolOutcome`], because a failing tool call must not abort the session.
/// Callers resolve and validate against [`Self::catalog`] first; an
/// unresolvable name reaching `invoke` is an adapter-level failure outcome,
/// not a panic.
#[async_trait]
pub trait ToolRuntime: Send + Sync {
    /// The fixed catalog this runtime serves. Read-only after startup.
    fn catalog(&self) -> &ToolCatalog;

    /// Check if a tool is available
    fn has_tool(&self, name: &str) -> bool {
        self.catalog().contains(name)
    }

    /// Run one tool call to completion.
    async fn invoke(&self, call: &ToolCall) -> ToolOutcome;
}
