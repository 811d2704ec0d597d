//! Control tools — domain selection and run finalization
//!
//! These are the always-visible tools: whatever domain is active, the model
//! can list and switch domains, reset to none, or finish the run. Their
//! definitions are pure data and live here; their behavior is implemented by
//! the step executor, which owns the per-session gate.

use crate::error::CatalogError;
use crate::tool::catalog::ToolCatalog;
use crate::tool::definition::{Domain, ParamType, ToolDefinition, ToolParameter};

/// Canonical name of the finalization tool.
pub const FINAL: &str = "assistant.final";

/// Shorthand names models use for [`FINAL`]; resolved via catalog aliases.
pub const FINAL_ALIASES: [&str; 3] = ["final", "assistant_final", "finish"];

pub const LIST: &str = "domain.list";
pub const DESCRIBE: &str = "domain.describe";
pub const RESET: &str = "domain.reset";

/// Selector tool name for a domain, e.g. `domain.files`.
pub fn selector_name(domain: Domain) -> String {
    format!("domain.{domain}")
}

/// Parse a selector tool name back to its domain. Only selectable domains
/// have selectors; `domain.control` is not a tool.
pub fn parse_selector(name: &str) -> Option<Domain> {
    let suffix = name.strip_prefix("domain.")?;
    let domain: Domain = suffix.parse().ok()?;
    domain.is_selectable().then_some(domain)
}

/// Definitions of every control tool, selectors included.
pub fn definitions() -> Vec<ToolDefinition> {
    let mut tools = vec![
        ToolDefinition::new(
            FINAL,
            "Finish the run and return the final answer to the user",
            Domain::Control,
        )
        .with_parameter(ToolParameter::new(
            "final_text",
            "The complete final answer",
            true,
        )),
        ToolDefinition::new(LIST, "List the available domains", Domain::Control),
        ToolDefinition::new(
            DESCRIBE,
            "Describe the tools of one domain without activating it",
            Domain::Control,
        )
        .with_parameter(ToolParameter::new(
            "name",
            "Domain name (files, apps, system, project, git, web)",
            true,
        )),
        ToolDefinition::new(RESET, "Deactivate the current domain", Domain::Control),
    ];

    for domain in Domain::SELECTABLE {
        let mut def = ToolDefinition::new(
            selector_name(domain),
            format!("Activate the '{domain}' domain and expose its tools"),
            Domain::Control,
        );
        if domain == Domain::Files {
            def = def
                .with_parameter(
                    ToolParameter::new(
                        "directory",
                        "Optionally list this directory right away",
                        false,
                    )
                    .with_type(ParamType::Path),
                )
                .with_parameter(ToolParameter::new(
                    "pattern",
                    "Optionally search for files matching this glob right away",
                    false,
                ));
        }
        tools.push(def);
    }

    tools
}

/// Register every control tool and finalization alias into a catalog.
pub fn register(catalog: &mut ToolCatalog) -> Result<(), CatalogError> {
    for tool in definitions() {
        catalog.register(tool)?;
    }
    for alias in FINAL_ALIASES {
        catalog.register_alias(alias, FINAL)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_round_trip() {
        for domain in Domain::SELECTABLE {
            assert_eq!(parse_selector(&selector_name(domain)), Some(domain));
        }
        assert_eq!(parse_selector("domain.control"), None);
        assert_eq!(parse_selector("files.read"), None);
        assert_eq!(parse_selector("domain.desk"), None);
    }

    #[test]
    fn test_register_control_tools() {
        let mut catalog = ToolCatalog::new();
        register(&mut catalog).unwrap();

        assert!(catalog.get(FINAL).is_some());
        assert!(catalog.get(LIST).is_some());
        assert!(catalog.get(DESCRIBE).is_some());
        assert!(catalog.get(RESET).is_some());
        for domain in Domain::SELECTABLE {
            assert!(catalog.get(&selector_name(domain)).is_some());
        }
        for alias in FINAL_ALIASES {
            assert_eq!(catalog.resolve(alias), Some(FINAL));
        }
        // everything here is a control tool
        assert!(catalog.all().all(|t| t.is_control()));
    }

    #[test]
    fn test_files_selector_accepts_chained_arguments() {
        let defs = definitions();
        let files = defs
            .iter()
            .find(|d| d.name == selector_name(Domain::Files))
            .unwrap();
        assert!(files.parameter("directory").is_some());
        assert!(files.parameter("pattern").is_some());

        let git = defs
            .iter()
            .find(|d| d.name == selector_name(Domain::Git))
            .unwrap();
        assert!(git.parameters.is_empty());
    }
}
