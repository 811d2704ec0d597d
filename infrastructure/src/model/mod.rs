//! Model-provider adapters

pub mod openai;
pub mod scripted;

pub use openai::{DEFAULT_BASE_URL, OpenAiClient, OpenAiConfig};
pub use scripted::ScriptedClient;
