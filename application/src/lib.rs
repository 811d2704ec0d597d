//! Application layer: the orchestration loop and its ports
//!
//! [`Engine::run`] is the one entry point a host calls. Everything the loop
//! needs from the outside world comes in through the ports: a
//! [`ModelClient`] for the provider, a [`ToolRuntime`] for handlers, a
//! [`SafetyPolicy`] for path vetting, a [`SchemaView`] for provider-facing
//! tool schemas, and an optional [`TraceSink`] for observers.

pub mod engine;
pub mod executor;
pub mod ports;
pub mod request;

pub use engine::Engine;
pub use executor::{StepExecutor, TurnOutcome};
pub use ports::{
    ModelClient, NoTraceSink, ProviderError, SafetyPolicy, SchemaView, ToolRuntime, ToolSchema,
    TraceEvent, TraceSink,
};
pub use request::{DEFAULT_TOOL_MAX_STEPS, RunRequest};
