//! Tool catalog — the fixed registry of capabilities
//!
//! Populated once at startup, read-only afterwards. What changes during a
//! session is *visibility* (see [`crate::gate`]), never membership.

use crate::error::{CatalogError, StepError};
use crate::tool::definition::{Domain, ToolDefinition};
use std::collections::HashMap;

/// Registry of available tools plus alias mappings.
///
/// Aliases exist because models occasionally shorten names they have seen
/// (`final` for `assistant.final`). Resolution prefers canonical names;
/// aliases can never shadow a registered tool.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: HashMap<String, ToolDefinition>,
    /// Alias → canonical name mapping (e.g. "final" → "assistant.final")
    aliases: HashMap<String, String>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool definition. Membership is fixed once startup
    /// registration is complete, so a second definition under the same name
    /// is a configuration bug, not something to silently overwrite.
    pub fn register(&mut self, tool: ToolDefinition) -> Result<(), CatalogError> {
        if self.tools.contains_key(&tool.name) {
            return Err(CatalogError::DuplicateTool { name: tool.name });
        }
        self.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    /// Register an alias for an already-registered tool.
    pub fn register_alias(
        &mut self,
        alias: impl Into<String>,
        canonical: impl Into<String>,
    ) -> Result<(), CatalogError> {
        let alias = alias.into();
        let canonical = canonical.into();
        if self.tools.contains_key(&alias) || self.aliases.contains_key(&alias) {
            return Err(CatalogError::DuplicateAlias { alias });
        }
        if !self.tools.contains_key(&canonical) {
            return Err(CatalogError::UnknownAliasTarget { alias, canonical });
        }
        self.aliases.insert(alias, canonical);
        Ok(())
    }

    /// Resolve a name to its canonical form: registered names resolve to
    /// themselves, aliases to their target, anything else to `None`.
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.tools.contains_key(name) {
            Some(name)
        } else {
            self.aliases.get(name).map(|s| s.as_str())
        }
    }

    /// Look up a definition by canonical name or alias.
    pub fn lookup(&self, name: &str) -> Result<&ToolDefinition, StepError> {
        self.resolve(name)
            .and_then(|canonical| self.tools.get(canonical))
            .ok_or_else(|| StepError::UnknownTool {
                name: name.to_string(),
            })
    }

    /// Exact-name lookup; aliases do not apply.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tools of one domain, sorted by name so schema exposure and domain
    /// descriptions are deterministic.
    pub fn list_by_domain(&self, domain: Domain) -> Vec<&ToolDefinition> {
        let mut tools: Vec<_> = self.tools.values().filter(|t| t.domain == domain).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_catalog() -> ToolCatalog {
        let mut catalog = ToolCatalog::new();
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
            .register(ToolDefinition::new(
                "assistant.final",
                "Finish the run",
                Domain::Control,
            ))
            .unwrap();
        catalog.register_alias("final", "assistant.final").unwrap();
        catalog
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut catalog = demo_catalog();
        let err = catalog
            .register(ToolDefinition::new("files.read", "Again", Domain::Files))
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateTool {
                name: "files.read".to_string()
            }
        );
        // registry membership unchanged
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_alias_resolution() {
        let catalog = demo_catalog();

        assert_eq!(catalog.resolve("files.read"), Some("files.read"));
        assert_eq!(catalog.resolve("final"), Some("assistant.final"));
        assert_eq!(catalog.resolve("nope"), None);

        assert_eq!(catalog.lookup("final").unwrap().name, "assistant.final");
        assert!(matches!(
            catalog.lookup("nope"),
            Err(StepError::UnknownTool { .. })
        ));

        // exact get ignores aliases
        assert!(catalog.get("assistant.final").is_some());
        assert!(catalog.get("final").is_none());
    }

    #[test]
    fn test_alias_guards() {
        let mut catalog = demo_catalog();

        // alias may not shadow a registered tool
        let err = catalog.register_alias("files.read", "git.status").unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateAlias { .. }));

        // alias must point at a registered tool
        let err = catalog.register_alias("st", "git.statuss").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownAliasTarget { .. }));

        // duplicate alias rejected
        let err = catalog.register_alias("final", "git.status").unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateAlias { .. }));
    }

    #[test]
    fn test_list_by_domain_is_sorted() {
        let catalog = demo_catalog();
        let files: Vec<_> = catalog
            .list_by_domain(Domain::Files)
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(files, ["files.list", "files.read"]);
        assert_eq!(catalog.list_by_domain(Domain::Web).len(), 0);
    }
}
