//! Tool schema conversion port.
//!
//! Separates "which tools are visible" (domain gate) from "how a tool is
//! serialized for a provider API" (infrastructure). The engine asks for the
//! schemas of whatever the gate exposes and forwards them untouched.

use serde::Serialize;
use toolgate_domain::ToolDefinition;

/// Provider-neutral schema of one tool: canonical name, description, and a
/// JSON-schema object for the parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Port for converting tool definitions to provider-facing schemas.
pub trait SchemaView: Send + Sync {
    /// Convert a single tool definition.
    fn schema_for(&self, tool: &ToolDefinition) -> ToolSchema;

    /// Convert a visible tool surface, preserving order.
    fn schemas_for(&self, tools: &[&ToolDefinition]) -> Vec<ToolSchema> {
        tools.iter().map(|t| self.schema_for(t)).collect()
    }
}
