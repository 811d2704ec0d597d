//! Tool definitions: the identity half of the capability catalog

use serde::{Deserialize, Serialize};

/// Default cap applied to a tool's serialized output, in bytes.
///
/// Individual definitions may raise it (file reads) via
/// [`ToolDefinition::with_result_cap`].
pub const DEFAULT_RESULT_CAP: usize = 20_000;

/// Default per-invocation handler timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A named grouping of related tools.
///
/// At any moment the model sees the control tools plus the tools of the one
/// active domain. Activation happens only through the `domain.*` selector
/// tools; `Control` itself is never activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Files,
    Apps,
    System,
    Project,
    Git,
    Web,
    /// Domain selectors and run control (`domain.*`, `assistant.final`).
    Control,
}

impl Domain {
    /// Domains that can be activated via a `domain.<name>` selector.
    pub const SELECTABLE: [Domain; 6] = [
        Domain::Files,
        Domain::Apps,
        Domain::System,
        Domain::Project,
        Domain::Git,
        Domain::Web,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Files => "files",
            Domain::Apps => "apps",
            Domain::System => "system",
            Domain::Project => "project",
            Domain::Git => "git",
            Domain::Web => "web",
            Domain::Control => "control",
        }
    }

    pub fn is_selectable(&self) -> bool {
        !matches!(self, Domain::Control)
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files" => Ok(Domain::Files),
            "apps" => Ok(Domain::Apps),
            "system" => Ok(Domain::System),
            "project" => Ok(Domain::Project),
            "git" => Ok(Domain::Git),
            "web" => Ok(Domain::Web),
            "control" => Ok(Domain::Control),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

/// Declared type of a tool parameter.
///
/// `Path` is load-bearing: every argument declared as a path is routed
/// through the workspace safety boundary before the handler runs. Handlers
/// never see an unchecked path argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Path,
    Integer,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Path => "path",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }

    /// JSON schema type this parameter maps to when exposed to the model.
    /// Paths are plain strings on the wire.
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamType::String | ParamType::Path => "string",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }
}

/// A declared parameter of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Whether this parameter is required
    pub required: bool,
    /// Declared parameter type
    pub param_type: ParamType,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: ParamType::String,
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }
}

/// Definition of one capability the model can invoke.
///
/// Immutable once registered in the catalog. The name is domain-qualified
/// (`files.read`, `git.status`); the handler is registered separately under
/// the same name by the tool runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Domain-qualified name of the tool (e.g., "files.read")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Domain this tool belongs to
    pub domain: Domain,
    /// Declared parameters
    pub parameters: Vec<ToolParameter>,
    /// Cap on the serialized result, in bytes
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,
    /// Handler timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_result_cap() -> usize {
    DEFAULT_RESULT_CAP
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, domain: Domain) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            domain,
            parameters: Vec::new(),
            result_cap: DEFAULT_RESULT_CAP,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_result_cap(mut self, cap: usize) -> Self {
        self.result_cap = cap;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn is_control(&self) -> bool {
        self.domain == Domain::Control
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Parameters the safety boundary must intercept.
    pub fn path_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters
            .iter()
            .filter(|p| p.param_type == ParamType::Path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_round_trip() {
        for domain in Domain::SELECTABLE {
            assert_eq!(domain.as_str().parse::<Domain>().unwrap(), domain);
            assert!(domain.is_selectable());
        }
        assert_eq!("control".parse::<Domain>().unwrap(), Domain::Control);
        assert!(!Domain::Control.is_selectable());
        assert!("desk".parse::<Domain>().is_err());
    }

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new("files.read", "Read file contents", Domain::Files)
            .with_parameter(ToolParameter::new("path", "File path to read", true).with_type(ParamType::Path))
            .with_result_cap(100_000);

        assert_eq!(tool.name, "files.read");
        assert_eq!(tool.domain, Domain::Files);
        assert!(!tool.is_control());
        assert_eq!(tool.parameters.len(), 1);
        assert_eq!(tool.result_cap, 100_000);
        assert_eq!(tool.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(tool.path_parameters().count(), 1);
    }

    #[test]
    fn test_param_type_json_mapping() {
        assert_eq!(ParamType::Path.json_type(), "string");
        assert_eq!(ParamType::String.json_type(), "string");
        assert_eq!(ParamType::Integer.json_type(), "integer");
        assert_eq!(ParamType::Boolean.json_type(), "boolean");
    }

    #[test]
    fn test_parameter_lookup() {
        let tool = ToolDefinition::new("files.search", "Search files", Domain::Files)
            .with_parameter(ToolParameter::new("pattern", "Glob pattern", true))
            .with_parameter(
                ToolParameter::new("directory", "Directory to search", false).with_type(ParamType::Path),
            );

        assert!(tool.parameter("pattern").is_some());
        assert!(tool.parameter("missing").is_none());
        let paths: Vec<_> = tool.path_parameters().map(|p| p.name.as_str()).collect();
        assert_eq!(paths, ["directory"]);
    }
}
