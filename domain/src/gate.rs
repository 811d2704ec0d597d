//! Domain gate — the per-session visibility state machine
//!
//! One mutable field: the active domain. Transitions happen only through
//! `domain.*` tool calls; everything else reads. The gate narrows the tool
//! surface shown to the model to the control tools plus the active domain's
//! tools, which keeps schemas small and makes cross-domain calls an explicit
//! two-step (switch, then act).
//!
//! ```text
//!            domain.files            domain.git
//!   none ───────────────▶ files ───────────────▶ git ── ...
//!    ▲                                            │
//!    └──────────────── domain.reset ◀─────────────┘
//! ```
//!
//! Scoped to one orchestration session. Never shared between sessions; the
//! catalog it filters is the shared, read-only part.

use crate::error::StepError;
use crate::tool::catalog::ToolCatalog;
use crate::tool::definition::{Domain, ToolDefinition};

/// Active-domain state for one session.
#[derive(Debug, Clone, Default)]
pub struct DomainGate {
    active: Option<Domain>,
}

impl DomainGate {
    /// New gate with no active domain.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<Domain> {
        self.active
    }

    /// Name of the active domain for messages and traces, `"none"` when idle.
    pub fn active_name(&self) -> &'static str {
        self.active.map(|d| d.as_str()).unwrap_or("none")
    }

    pub fn activate(&mut self, domain: Domain) {
        self.active = Some(domain);
    }

    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Whether one tool is currently visible: control tools always, domain
    /// tools only while their domain is active.
    pub fn is_visible(&self, tool: &ToolDefinition) -> bool {
        tool.is_control() || self.active == Some(tool.domain)
    }

    /// The tool surface currently exposed to the model: control tools first,
    /// then the active domain's tools, each sorted by name.
    pub fn visible<'a>(&self, catalog: &'a ToolCatalog) -> Vec<&'a ToolDefinition> {
        let mut tools = catalog.list_by_domain(Domain::Control);
        if let Some(domain) = self.active {
            tools.extend(catalog.list_by_domain(domain));
        }
        tools
    }

    /// Resolve a proposed call name against the visible surface. This is the
    /// entry of the single choke point every tool call passes through.
    pub fn resolve<'a>(
        &self,
        catalog: &'a ToolCatalog,
        name: &str,
    ) -> Result<&'a ToolDefinition, StepError> {
        let tool = catalog.lookup(name)?;
        if self.is_visible(tool) {
            Ok(tool)
        } else {
            Err(StepError::ToolNotActive {
                name: tool.name.clone(),
                active: self.active_name().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::control;

    fn catalog() -> ToolCatalog {
        let mut catalog = ToolCatalog::new();
        control::register(&mut catalog).unwrap();
        catalog
            .register(ToolDefinition::new("files.read", "Read a file", Domain::Files))
            .unwrap();
        catalog
            .register(ToolDefinition::new("files.list", "List a directory", Domain::Files))
            .unwrap();
        catalog
            .register(ToolDefinition::new("git.status", "Git status", Domain::Git))
            .unwrap();
        catalog
    }

    #[test]
    fn test_starts_idle() {
        let gate = DomainGate::new();
        assert_eq!(gate.active(), None);
        assert_eq!(gate.active_name(), "none");
    }

    #[test]
    fn test_transitions() {
        let mut gate = DomainGate::new();
        gate.activate(Domain::Files);
        assert_eq!(gate.active(), Some(Domain::Files));
        assert_eq!(gate.active_name(), "files");

        gate.activate(Domain::Git);
        assert_eq!(gate.active(), Some(Domain::Git));

        gate.reset();
        assert_eq!(gate.active(), None);
    }

    #[test]
    fn test_visibility_follows_active_domain() {
        let catalog = catalog();
        let mut gate = DomainGate::new();

        // idle: only control tools
        let names: Vec<_> = gate.visible(&catalog).iter().map(|t| t.name.clone()).collect();
        assert!(names.contains(&control::FINAL.to_string()));
        assert!(!names.iter().any(|n| n.starts_with("files.")));

        gate.activate(Domain::Files);
        let names: Vec<_> = gate.visible(&catalog).iter().map(|t| t.name.clone()).collect();
        assert!(names.contains(&"files.read".to_string()));
        assert!(names.contains(&"files.list".to_string()));
        assert!(!names.contains(&"git.status".to_string()));
        // control tools stay visible
        assert!(names.contains(&control::RESET.to_string()));
    }

    #[test]
    fn test_visible_order_is_deterministic() {
        let catalog = catalog();
        let mut gate = DomainGate::new();
        gate.activate(Domain::Files);

        let first: Vec<_> = gate.visible(&catalog).iter().map(|t| t.name.clone()).collect();
        let second: Vec<_> = gate.visible(&catalog).iter().map(|t| t.name.clone()).collect();
        assert_eq!(first, second);
        // domain tools come after the control block, sorted
        let files_read = first.iter().position(|n| n == "files.read").unwrap();
        let files_list = first.iter().position(|n| n == "files.list").unwrap();
        assert!(files_list < files_read);
    }

    #[test]
    fn test_resolve_enforces_the_gate() {
        let catalog = catalog();
        let mut gate = DomainGate::new();

        // control tools resolve while idle
        assert!(gate.resolve(&catalog, control::FINAL).is_ok());
        assert!(gate.resolve(&catalog, "final").is_ok());

        // domain tool while idle
        let err = gate.resolve(&catalog, "files.read").unwrap_err();
        assert!(matches!(err, StepError::ToolNotActive { .. }));

        // unknown name
        let err = gate.resolve(&catalog, "files.explode").unwrap_err();
        assert!(matches!(err, StepError::UnknownTool { .. }));

        gate.activate(Domain::Files);
        assert!(gate.resolve(&catalog, "files.read").is_ok());

        // cross-domain call with files active
        let err = gate.resolve(&catalog, "git.status").unwrap_err();
        assert!(matches!(
            err,
            StepError::ToolNotActive { ref active, .. } if active == "files"
        ));
    }
}
