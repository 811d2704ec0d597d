//! Run request — per-session knobs for the orchestration loop

use toolgate_domain::Domain;

/// Default combined budget for turns and executed steps.
pub const DEFAULT_TOOL_MAX_STEPS: usize = 4;

/// One orchestration session's input: the user prompt plus loop policy.
///
/// `tool_max_steps` bounds both provider turns and executed tool calls, so
/// a model that keeps talking without calling tools runs out of budget just
/// like one that keeps calling tools.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub prompt: String,
    /// Overrides the built-in system prompt when set.
    pub system_message: Option<String>,
    pub tool_max_steps: usize,
    /// When set, plain assistant text is not accepted as an answer; the
    /// model is nudged toward the finalization tool instead.
    pub require_final_tool: bool,
    /// Domain activated by the host before the first turn.
    pub domain_hint: Option<Domain>,
}

impl RunRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_message: None,
            tool_max_steps: DEFAULT_TOOL_MAX_STEPS,
            require_final_tool: false,
            domain_hint: None,
        }
    }

    pub fn with_system_message(mut self, message: impl Into<String>) -> Self {
        self.system_message = Some(message.into());
        self
    }

    pub fn with_tool_max_steps(mut self, steps: usize) -> Self {
        self.tool_max_steps = steps;
        self
    }

    pub fn require_final(mut self, required: bool) -> Self {
        self.require_final_tool = required;
        self
    }

    pub fn with_domain_hint(mut self, domain: Domain) -> Self {
        self.domain_hint = Some(domain);
        self
    }
}
