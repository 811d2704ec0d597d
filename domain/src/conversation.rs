//! Conversation types exchanged with the model-provider client

use serde::{Deserialize, Serialize};

use crate::tool::call::ToolCall;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// A tool result being fed back to the model.
    Tool,
}

/// A message in a conversation.
///
/// Assistant messages may carry the tool calls the model proposed on that
/// turn; tool messages carry the id of the call they answer. Both are needed
/// to rebuild a provider-native conversation from plain history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool calls proposed by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For tool messages: id of the call this result answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Assistant message carrying proposed tool calls (text optional).
    pub fn assistant_with_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.unwrap_or_default(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Tool-result message answering one call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// One model turn: assistant text, tool calls, or both.
///
/// This is the whole of what the orchestration loop needs from a provider
/// response; stop reasons, token counts and other provider detail stay in
/// the adapter.
#[derive(Debug, Clone, Default)]
pub struct AssistantTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantTurn {
    /// Text-only turn.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn new(text: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self { text, tool_calls }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Assistant text, empty string when the turn carried none.
    pub fn text_content(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("be brief").role, Role::System);
        assert_eq!(Message::user("hi").role, Role::User);
        assert_eq!(Message::assistant("hello").role, Role::Assistant);

        let result = Message::tool_result("call_1", "output");
        assert_eq!(result.role, Role::Tool);
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_assistant_with_calls() {
        let calls = vec![ToolCall::new("files.list")];
        let msg = Message::assistant_with_calls(Some("listing".to_string()), calls);
        assert_eq!(msg.content, "listing");
        assert_eq!(msg.tool_calls.len(), 1);

        let msg = Message::assistant_with_calls(None, vec![ToolCall::new("files.list")]);
        assert!(msg.content.is_empty());
    }

    #[test]
    fn test_assistant_turn() {
        let turn = AssistantTurn::text("done");
        assert!(!turn.has_tool_calls());
        assert_eq!(turn.text_content(), "done");

        let turn = AssistantTurn::new(None, vec![ToolCall::new("git.status")]);
        assert!(turn.has_tool_calls());
        assert_eq!(turn.text_content(), "");
    }
}
