//! Run trace — the ordered, immutable record of one session
//!
//! A [`StepRecord`] is appended per executed tool call, in proposal order,
//! and never mutated afterwards. The [`RunResult`] bundles the trace with
//! the final text and the reason the loop stopped; it is the one artifact a
//! caller receives, success or not.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::tool::outcome::ToolError;

/// Why the orchestration loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The model called `assistant.final` (or an alias).
    FinalToolCalled,
    /// The step budget ran out before a final call.
    StepLimitReached,
    /// The model answered with plain text and finalization was not required.
    ModelStoppedCallingTools,
    /// The model-provider call failed; the run could not continue.
    ProviderFailed,
    /// The host cancelled the session between turns.
    Cancelled,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::FinalToolCalled => "final_tool_called",
            TerminationReason::StepLimitReached => "step_limit_reached",
            TerminationReason::ModelStoppedCallingTools => "model_stopped_calling_tools",
            TerminationReason::ProviderFailed => "provider_failed",
            TerminationReason::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of executing one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Domain-qualified tool name as resolved (canonical, not the alias)
    pub name: String,
    /// Arguments as received from the model
    pub arguments: HashMap<String, serde_json::Value>,
    /// Success payload or error description
    pub result: String,
    /// Whether the call succeeded
    pub ok: bool,
    /// True when the result exceeded the tool's size cap and was clipped
    pub truncated: bool,
}

impl StepRecord {
    pub fn success(
        name: impl Into<String>,
        arguments: HashMap<String, serde_json::Value>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            arguments,
            result: result.into(),
            ok: true,
            truncated: false,
        }
    }

    pub fn failure(
        name: impl Into<String>,
        arguments: HashMap<String, serde_json::Value>,
        error: &ToolError,
    ) -> Self {
        Self {
            name: name.into(),
            arguments,
            result: error.to_string(),
            ok: false,
            truncated: false,
        }
    }
}

/// Terminal artifact of one orchestration session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Definitive output text; possibly empty.
    #[serde(rename = "text")]
    pub final_text: String,
    /// Ordered trace of executed steps.
    pub steps: Vec<StepRecord>,
    /// Why the loop stopped.
    pub terminated_reason: TerminationReason,
    /// Provider error description when `terminated_reason` is
    /// `provider_failed`; absent otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_error: Option<String>,
}

impl RunResult {
    pub fn new(
        final_text: impl Into<String>,
        steps: Vec<StepRecord>,
        terminated_reason: TerminationReason,
    ) -> Self {
        Self {
            final_text: final_text.into(),
            steps,
            terminated_reason,
            provider_error: None,
        }
    }

    pub fn provider_failed(steps: Vec<StepRecord>, error: impl Into<String>) -> Self {
        Self {
            final_text: String::new(),
            steps,
            terminated_reason: TerminationReason::ProviderFailed,
            provider_error: Some(error.into()),
        }
    }

    /// Number of failed steps in the trace.
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }
}
