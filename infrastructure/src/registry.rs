//! Tool registry — fixed catalog plus provider routing
//!
//! The registry aggregates the domain providers into the one catalog the
//! whole session reads from. It is assembled once at startup: duplicate
//! names fail the build rather than shadowing, and nothing can be added
//! afterwards. At execution time it routes a call to the provider that
//! declared the tool.
//!
//! ```ignore
//! let registry = ToolRegistry::builder()
//!     .register(FilesProvider::new(workspace.clone()))
//!     .register(GitProvider::new(workspace.clone()))
//!     .build()?;
//! assert!(registry.catalog().contains("files.read"));
//! ```
//!
//! The control tools (`domain.*`, `assistant.final`) are always part of the
//! catalog; they are executed by the step executor, not routed here.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use toolgate_application::ToolRuntime;
use toolgate_domain::{CatalogError, ToolCall, ToolCatalog, ToolError, ToolOutcome, control};

use crate::provider::ToolProvider;
use crate::tools;

/// Routes tool calls to the provider that declared them.
pub struct ToolRegistry {
    providers: Vec<Arc<dyn ToolProvider>>,
    /// Tool name to provider index.
    routes: HashMap<String, usize>,
    catalog: ToolCatalog,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder {
            providers: Vec::new(),
        }
    }

    /// Registry with every built-in domain provider rooted at `workspace`.
    pub fn with_builtin_providers(workspace: PathBuf) -> Result<Self, CatalogError> {
        let builder = Self::builder()
            .register(tools::files::FilesProvider::new(workspace.clone()))
            .register(tools::project::ProjectProvider::new(workspace.clone()))
            .register(tools::git::GitProvider::new(workspace.clone()))
            .register(tools::system::SystemProvider::new(workspace.clone()))
            .register(tools::apps::AppsProvider::new());
        #[cfg(feature = "web-tools")]
        let builder = builder.register(tools::web::WebProvider::new());
        builder.build()
    }
}

pub struct ToolRegistryBuilder {
    providers: Vec<Arc<dyn ToolProvider>>,
}

impl ToolRegistryBuilder {
    pub fn register<P: ToolProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn register_arc(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Build the fixed catalog. A name claimed twice is a wiring error and
    /// fails the whole build.
    pub fn build(self) -> Result<ToolRegistry, CatalogError> {
        let mut catalog = ToolCatalog::new();
        control::register(&mut catalog)?;

        let mut routes = HashMap::new();
        for (index, provider) in self.providers.iter().enumerate() {
            for tool in provider.definitions() {
                debug!(tool = %tool.name, provider = provider.id(), "registered tool");
                let name = tool.name.clone();
                catalog.register(tool)?;
                routes.insert(name, index);
            }
        }

        Ok(ToolRegistry {
            providers: self.providers,
            routes,
            catalog,
        })
    }
}

#[async_trait]
impl ToolRuntime for ToolRegistry {
    fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    async fn invoke(&self, call: &ToolCall) -> ToolOutcome {
        match self
            .routes
            .get(&call.name)
            .and_then(|index| self.providers.get(*index))
        {
            Some(provider) => provider.execute(call).await,
            None => ToolOutcome::failure(&call.name, ToolError::unknown_tool(&call.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use toolgate_domain::{Domain, ToolDefinition};

    struct EchoProvider {
        id: &'static str,
        tool: &'static str,
    }

    #[async_trait]
    impl ToolProvider for EchoProvider {
        fn id(&self) -> &str {
            self.id
        }

        fn definitions(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition::new(self.tool, "Echo", Domain::Files)]
        }

        async fn execute(&self, call: &ToolCall) -> ToolOutcome {
            ToolOutcome::success(&call.name, format!("echo from {}", self.id))
        }
    }

    #[tokio::test]
    async fn routes_calls_to_the_declaring_provider() {
        let registry = ToolRegistry::builder()
            .register(EchoProvider {
                id: "one",
                tool: "files.first",
            })
            .register(EchoProvider {
                id: "two",
                tool: "files.second",
            })
            .build()
            .unwrap();

        let outcome = registry.invoke(&ToolCall::new("files.second")).await;
        assert_eq!(outcome.output(), Some("echo from two"));
    }

    #[test]
    fn duplicate_tool_names_fail_the_build() {
        let result = ToolRegistry::builder()
            .register(EchoProvider {
                id: "one",
                tool: "files.same",
            })
            .register(EchoProvider {
                id: "two",
                tool: "files.same",
            })
            .build();

        assert!(matches!(result, Err(CatalogError::DuplicateTool { .. })));
    }

    #[test]
    fn control_tools_are_always_in_the_catalog() {
        let registry = ToolRegistry::builder().build().unwrap();
        assert!(registry.catalog().contains(control::FINAL));
        assert!(registry.catalog().contains("domain.files"));
        assert!(registry.catalog().contains(control::RESET));
    }

    #[tokio::test]
    async fn unrouted_call_fails_cleanly() {
        let registry = ToolRegistry::builder().build().unwrap();
        let outcome = registry.invoke(&ToolCall::new("files.read")).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.error().unwrap().code, "UNKNOWN_TOOL");
    }

    #[tokio::test]
    async fn builtin_registry_covers_every_selectable_domain() {
        let dir = tempdir().unwrap();
        let registry = ToolRegistry::with_builtin_providers(dir.path().to_path_buf()).unwrap();

        for name in [
            "files.read",
            "files.write",
            "files.list",
            "project.search_text",
            "git.status",
            "system.exec_ro",
            "apps.open",
        ] {
            assert!(registry.catalog().contains(name), "missing {name}");
        }
        #[cfg(feature = "web-tools")]
        assert!(registry.catalog().contains("web.fetch"));
    }
}
