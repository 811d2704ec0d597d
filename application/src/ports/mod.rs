//! Application ports
//!
//! Boundary traits between the orchestration engine and the outside world.
//! Implementations live in the infrastructure layer.

pub mod model_client;
pub mod safety;
pub mod schema;
pub mod tool_runtime;
pub mod trace_sink;

pub use model_client::{ModelClient, ProviderError};
pub use safety::SafetyPolicy;
pub use schema::{SchemaView, ToolSchema};
pub use tool_runtime::ToolRuntime;
pub use trace_sink::{NoTraceSink, TraceEvent, TraceSink};
