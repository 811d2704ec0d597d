//! Builtin tool handlers, one module per selectable domain

pub mod apps;
pub mod files;
pub mod git;
pub mod project;
pub mod system;
#[cfg(feature = "web-tools")]
pub mod web;
