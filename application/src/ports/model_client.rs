//! Model-provider client port
//!
//! One blocking round-trip per turn: the engine hands over the conversation
//! and the currently visible tool schemas, the provider answers with text,
//! tool calls, or both. Retry and backoff policy belongs to adapters; the
//! loop only ever sees success or a terminal failure for the turn.

use async_trait::async_trait;
use thiserror::Error;
use toolgate_domain::{AssistantTurn, Message};

use crate::ports::schema::ToolSchema;

/// Errors that can occur during a model-provider round-trip.
///
/// Unlike tool failures, these are not recoverable within a turn: the
/// session terminates with `provider_failed` and the caller still receives
/// the trace accumulated so far.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider timed out after {0}s")]
    Timeout(u64),
}

/// Gateway to the language model driving the session.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the conversation plus the visible tool schemas; receive the
    /// model's next turn.
    async fn converse(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<AssistantTurn, ProviderError>;
}
