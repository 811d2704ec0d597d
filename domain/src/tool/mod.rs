//! Tool domain module
//!
//! Defines the capability model: every operation the model can invoke is a
//! named, schema-described tool belonging to one domain, held in a fixed
//! [`ToolCatalog`] built at startup.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolCatalog  │───▶│ ToolCall     │───▶│ ToolOutcome  │
//! │ (registry)   │    │ (invocation) │    │ (output)     │
//! └──────┬───────┘    └──────────────┘    └──────────────┘
//!        │
//!        ├─ aliases: "final" → "assistant.final"
//!        └─ tools:   "files.read" → ToolDefinition
//! ```
//!
//! # Name resolution
//!
//! Models occasionally shorten tool names they have seen. The catalog's
//! alias map resolves those without an extra round-trip; canonical names
//! always win over aliases. Only the finalization tool carries aliases by
//! default ([`control::FINAL_ALIASES`]).
//!
//! # Domain gating
//!
//! Each tool is tagged with a [`Domain`](definition::Domain). Membership in
//! the catalog never changes at runtime; which tools the model *sees* is
//! decided per session by [`crate::gate::DomainGate`]. Control tools
//! (`domain.*`, `assistant.final`) are exempt from gating.
//!
//! # Key types
//!
//! - [`ToolCatalog`] — registry of available tools + alias mappings
//! - [`ToolDefinition`] — schema for a single tool (name, params, domain,
//!   result cap, timeout)
//! - [`ToolCall`] — an invocation request with arguments
//! - [`ToolOutcome`] — execution outcome with structured
//!   [`OutcomeMetadata`](outcome::OutcomeMetadata)
//! - [`validate::validate_call`] — pure argument validation
//! - [`control`] — the always-visible selector and finalization tools

pub mod call;
pub mod catalog;
pub mod control;
pub mod definition;
pub mod outcome;
pub mod validate;

pub use call::ToolCall;
pub use catalog::ToolCatalog;
pub use definition::{Domain, ParamType, ToolDefinition, ToolParameter};
pub use outcome::{OutcomeMetadata, ToolError, ToolOutcome};
pub use validate::validate_call;
