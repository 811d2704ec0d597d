//! Configuration loading and data types

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{ModelSettings, RunSettings, SafetySettings, Settings, TraceSettings};
