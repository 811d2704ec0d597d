//! Argument validation against a tool's declared schema
//!
//! Pure domain logic, no I/O. The step executor runs this before the safety
//! boundary and the handler; a rejection becomes a failed trace record.

use crate::error::StepError;
use crate::tool::call::ToolCall;
use crate::tool::definition::{ParamType, ToolDefinition};
use std::collections::HashSet;

/// Validate a tool call against its definition: required parameters present,
/// no undeclared parameters, values shaped per the declared type.
pub fn validate_call(definition: &ToolDefinition, call: &ToolCall) -> Result<(), StepError> {
    let invalid = |reason: String| StepError::InvalidArguments {
        name: definition.name.clone(),
        reason,
    };

    for param in &definition.parameters {
        if param.required && !call.arguments.contains_key(&param.name) {
            return Err(invalid(format!(
                "missing required parameter '{}'",
                param.name
            )));
        }
    }

    let declared: HashSet<&str> = definition.parameters.iter().map(|p| p.name.as_str()).collect();
    for arg_name in call.arguments.keys() {
        if !declared.contains(arg_name.as_str()) {
            return Err(invalid(format!("unknown parameter '{arg_name}'")));
        }
    }

    for param in &definition.parameters {
        let Some(value) = call.arguments.get(&param.name) else {
            continue;
        };
        let ok = match param.param_type {
            ParamType::String | ParamType::Path => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
        };
        if !ok {
            return Err(invalid(format!(
                "parameter '{}' must be a {}",
                param.name,
                param.param_type.json_type()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::definition::{Domain, ToolParameter};

    fn read_definition() -> ToolDefinition {
        ToolDefinition::new("files.read", "Read a file", Domain::Files)
            .with_parameter(ToolParameter::new("path", "File path", true).with_type(ParamType::Path))
            .with_parameter(
                ToolParameter::new("limit", "Max lines", false).with_type(ParamType::Integer),
            )
    }

    #[test]
    fn test_missing_required_parameter() {
        let call = ToolCall::new("files.read");
        let err = validate_call(&read_definition(), &call).unwrap_err();
        assert!(matches!(err, StepError::InvalidArguments { .. }));
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_unknown_parameter() {
        let call = ToolCall::new("files.read")
            .with_arg("path", "/tmp/a.txt")
            .with_arg("mode", "fast");
        let err = validate_call(&read_definition(), &call).unwrap_err();
        assert!(err.to_string().contains("unknown parameter 'mode'"));
    }

    #[test]
    fn test_wrong_shape() {
        let call = ToolCall::new("files.read")
            .with_arg("path", "/tmp/a.txt")
            .with_arg("limit", "forty");
        let err = validate_call(&read_definition(), &call).unwrap_err();
        assert!(err.to_string().contains("'limit' must be a integer"));

        let call = ToolCall::new("files.read").with_arg("path", 7);
        let err = validate_call(&read_definition(), &call).unwrap_err();
        assert!(err.to_string().contains("'path' must be a string"));
    }

    #[test]
    fn test_valid_call() {
        let call = ToolCall::new("files.read")
            .with_arg("path", "/tmp/a.txt")
            .with_arg("limit", 40);
        assert!(validate_call(&read_definition(), &call).is_ok());
    }
}
