//! Raw TOML configuration data types
//!
//! These structs mirror the structure of the config file. CLI flags override
//! individual fields after loading.

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_BASE_URL;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: ModelSettings,
    pub run: RunSettings,
    pub safety: SafetySettings,
    pub trace: TraceSettings,
}

/// `[model]` section: which endpoint answers the prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model name sent with each request
    pub name: String,
    /// Base URL of an OpenAI-compatible endpoint
    pub endpoint: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: Option<f32>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "gpt-4o-mini".to_string(),
            endpoint: DEFAULT_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: None,
            timeout_secs: 120,
        }
    }
}

impl ModelSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }
}

/// `[run]` section: loop defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Step budget per run
    pub steps: usize,
    /// Whether the model must finalize through `assistant.final`
    pub require_final: bool,
    /// Domain to pre-activate before the first turn
    pub domain: Option<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            steps: 25,
            require_final: true,
            domain: None,
        }
    }
}

/// `[safety]` section: workspace containment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetySettings {
    /// Workspace root (default: current directory)
    pub workspace: Option<String>,
    /// Reject paths escaping the workspace root
    pub enforce: bool,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            workspace: None,
            enforce: true,
        }
    }
}

/// `[trace]` section: session audit log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    /// JSONL file receiving run events; disabled when unset
    pub log_file: Option<String>,
}
