//! JSON Schema projection of tool definitions
//!
//! Providers only describe parameters structurally. This view renders the
//! `{"type": "object", ...}` parameter schema the chat-completions tool
//! format expects.

use serde_json::json;

use toolgate_application::{SchemaView, ToolSchema};
use toolgate_domain::ToolDefinition;

/// Renders tool definitions as JSON Schema objects.
pub struct JsonSchemaView;

impl SchemaView for JsonSchemaView {
    fn schema_for(&self, tool: &ToolDefinition) -> ToolSchema {
        let mut properties = serde_json::Map::new();
        for param in &tool.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.param_type.json_type(),
                    "description": param.description,
                }),
            );
        }
        let required: Vec<&str> = tool
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        ToolSchema {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolgate_domain::{Domain, ParamType, ToolParameter};

    fn read_definition() -> ToolDefinition {
        ToolDefinition::new("files.read", "Read a file", Domain::Files)
            .with_parameter(
                ToolParameter::new("path", "Path to the file", true).with_type(ParamType::Path),
            )
            .with_parameter(
                ToolParameter::new("offset", "Line to start from", false)
                    .with_type(ParamType::Integer),
            )
    }

    #[test]
    fn test_schema_shape() {
        let schema = JsonSchemaView.schema_for(&read_definition());

        assert_eq!(schema.name, "files.read");
        assert_eq!(schema.parameters["type"], "object");
        // paths travel as strings on the wire
        assert_eq!(schema.parameters["properties"]["path"]["type"], "string");
        assert_eq!(
            schema.parameters["properties"]["offset"]["type"],
            "integer"
        );
        assert_eq!(schema.parameters["required"], json!(["path"]));
    }

    #[test]
    fn test_parameterless_tool_has_empty_schema() {
        let def = ToolDefinition::new("git.status", "Show status", Domain::Git);
        let schema = JsonSchemaView.schema_for(&def);

        assert_eq!(schema.parameters["properties"], json!({}));
        assert_eq!(schema.parameters["required"], json!([]));
    }

    #[test]
    fn test_schemas_for_keeps_order() {
        let a = read_definition();
        let b = ToolDefinition::new("git.status", "Show status", Domain::Git);
        let schemas = JsonSchemaView.schemas_for(&[&a, &b]);

        let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["files.read", "git.status"]);
    }
}
