//! Session trace logging

pub mod trace_log;

pub use trace_log::JsonlTraceLogger;
