//! Infrastructure layer: tool handlers, workspace guard, model adapters,
//! configuration and trace logging
//!
//! Everything here either implements a port defined by the application layer
//! or feeds the registry that does. Nothing above this crate touches the
//! filesystem, subprocesses, or the network directly.

pub mod config;
pub mod guard;
pub mod logging;
pub mod model;
pub mod provider;
pub mod registry;
pub mod schema;
pub mod tools;

pub use config::{ConfigLoader, Settings};
pub use guard::WorkspaceGuard;
pub use logging::JsonlTraceLogger;
pub use model::{OpenAiClient, OpenAiConfig, ScriptedClient};
pub use provider::ToolProvider;
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use schema::JsonSchemaView;
