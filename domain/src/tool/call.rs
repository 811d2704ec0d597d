//! Tool calls — one proposed invocation from the model

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A call to a tool with arguments.
///
/// One model turn may propose zero, one, or several of these. The
/// `native_id` is the provider-assigned call id, kept so tool results can be
/// correlated back into the provider conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Domain-qualified name of the tool to call
    pub name: String,
    /// Arguments passed to the tool
    pub arguments: HashMap<String, serde_json::Value>,
    /// Provider-assigned call id, when the provider supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: HashMap::new(),
            native_id: None,
        }
    }

    /// Build a call from a provider tool-use block.
    pub fn from_native(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            name: name.into(),
            arguments,
            native_id: Some(id.into()),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        self.get_string(key)
            .ok_or_else(|| format!("Missing required argument: {key}"))
    }

    /// Get an optional i64 argument
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.arguments.get(key).and_then(|v| v.as_i64())
    }

    /// Get an optional non-negative integer argument
    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
    }

    /// Get an optional bool argument
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.arguments.get(key).and_then(|v| v.as_bool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_accessors() {
        let call = ToolCall::new("files.read")
            .with_arg("path", "/tmp/notes.txt")
            .with_arg("limit", 40)
            .with_arg("raw", true);

        assert_eq!(call.name, "files.read");
        assert!(call.native_id.is_none());
        assert_eq!(call.get_string("path"), Some("/tmp/notes.txt"));
        assert_eq!(call.require_string("path").unwrap(), "/tmp/notes.txt");
        assert!(call.require_string("missing").is_err());
        assert_eq!(call.get_i64("limit"), Some(40));
        assert_eq!(call.get_usize("limit"), Some(40));
        assert_eq!(call.get_bool("raw"), Some(true));
        assert_eq!(call.get_string("limit"), None);
    }

    #[test]
    fn test_from_native_keeps_call_id() {
        let args = [("path".to_string(), serde_json::json!("/src/main.rs"))]
            .into_iter()
            .collect();
        let call = ToolCall::from_native("call_abc123", "files.read", args);

        assert_eq!(call.native_id.as_deref(), Some("call_abc123"));
        assert_eq!(call.get_string("path"), Some("/src/main.rs"));
    }
}
