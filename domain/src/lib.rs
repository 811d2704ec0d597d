//! Domain layer for toolgate
//!
//! This crate contains the pure core of the tool-calling engine: the
//! capability catalog, the domain gate, conversation and trace types, and
//! the error taxonomy. It performs no I/O and has no dependency on the
//! application or infrastructure layers.
//!
//! # Core Concepts
//!
//! ## Domain gating
//!
//! Tools are grouped into domains (files, apps, system, project, git, web).
//! A session exposes the control tools plus at most one active domain to
//! the model; switching domains is itself a tool call. The
//! [`DomainGate`] holds that per-session state.
//!
//! ## Trace
//!
//! Every executed tool call becomes a [`StepRecord`], appended in proposal
//! order and never mutated. A run ends in a [`RunResult`] with an explicit
//! [`TerminationReason`]; there is no other way out of the loop.

pub mod conversation;
pub mod error;
pub mod gate;
pub mod tool;
pub mod trace;

// Re-export commonly used types
pub use conversation::{AssistantTurn, Message, Role};
pub use error::{CatalogError, StepError};
pub use gate::DomainGate;
pub use tool::{
    call::ToolCall,
    catalog::ToolCatalog,
    control,
    definition::{Domain, ParamType, ToolDefinition, ToolParameter},
    outcome::{OutcomeMetadata, ToolError, ToolOutcome},
    validate::validate_call,
};
pub use trace::{RunResult, StepRecord, TerminationReason};
