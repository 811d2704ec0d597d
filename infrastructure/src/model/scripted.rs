//! Scripted model client for deterministic runs
//!
//! Plays back a fixed sequence of turns, one per `converse` call. Useful for
//! demos and tests that must not touch the network. An exhausted script
//! yields empty turns, which the engine reads as the model going quiet.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use toolgate_application::{ModelClient, ProviderError, ToolSchema};
use toolgate_domain::{AssistantTurn, Message};

pub struct ScriptedClient {
    turns: Mutex<VecDeque<AssistantTurn>>,
}

impl ScriptedClient {
    pub fn new(turns: Vec<AssistantTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn converse(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<AssistantTurn, ProviderError> {
        debug!(
            messages = messages.len(),
            visible_tools = tools.len(),
            "scripted turn requested"
        );
        let next = self
            .turns
            .lock()
            .map(|mut turns| turns.pop_front())
            .unwrap_or_default();
        Ok(next.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolgate_domain::ToolCall;

    #[tokio::test]
    async fn test_turns_play_back_in_order() {
        let client = ScriptedClient::new(vec![
            AssistantTurn::new(None, vec![ToolCall::new("domain.files")]),
            AssistantTurn::text("done"),
        ]);

        let first = client.converse(&[], &[]).await.unwrap();
        assert_eq!(first.tool_calls[0].name, "domain.files");

        let second = client.converse(&[], &[]).await.unwrap();
        assert_eq!(second.text_content(), "done");
    }

    #[tokio::test]
    async fn test_exhausted_script_goes_quiet() {
        let client = ScriptedClient::new(vec![]);

        let turn = client.converse(&[], &[]).await.unwrap();
        assert!(turn.text.is_none());
        assert!(!turn.has_tool_calls());
    }
}
