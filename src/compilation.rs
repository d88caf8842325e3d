//! The compilation context shared by every resource.
//!
//! Built once at startup from [`ServerConfig`], then frozen behind an `Arc`.
//! Resources receive their own `Arc<Compilation>` and can read but never
//! mutate it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{Mode, ServerConfig};
use crate::resource::builtin;
use crate::resource::registry::PluginDescriptor;

/// Errors building a [`Compilation`].
#[derive(Debug, Error)]
pub enum CompilationError {
    #[error("workspace directory {path} is not accessible: {source}")]
    MissingWorkspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable snapshot of the server configuration.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Absolute, canonical directory holding the user's sources.
    pub workspace_directory: PathBuf,
    /// Absolute directory the build writes into.
    pub output_directory: PathBuf,
    /// Rendering mode.
    pub mode: Mode,
    /// Dev server proxy table.
    pub proxy_table: ProxyTable,
    /// Registered plugins, built-ins first as declared.
    pub plugins: Vec<PluginDescriptor>,
}

impl Compilation {
    /// Resolve the configured directories against `project_dir` and seed the
    /// plugin list with the built-in resources.
    pub fn new(config: &ServerConfig, project_dir: &Path) -> Result<Self, CompilationError> {
        let workspace = project_dir.join(&config.workspace);
        let workspace_directory = std::fs::canonicalize(&workspace).map_err(|source| {
            CompilationError::MissingWorkspace {
                path: workspace.clone(),
                source,
            }
        })?;

        Ok(Self {
            workspace_directory,
            output_directory: project_dir.join(&config.output_dir),
            mode: config.mode,
            proxy_table: ProxyTable::new(config.dev_server.proxy.clone()),
            plugins: builtin::descriptors(),
        })
    }

    /// Append a plugin. Only meaningful before the server starts.
    pub fn with_plugin(mut self, plugin: PluginDescriptor) -> Self {
        self.plugins.push(plugin);
        self
    }
}

/// Path prefix to upstream base URL mapping.
#[derive(Debug, Clone, Default)]
pub struct ProxyTable {
    entries: BTreeMap<String, String>,
}

impl ProxyTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Find the entry whose prefix matches `path`.
    ///
    /// Entries are visited in sorted order and the last match wins, which
    /// makes the longest matching prefix the winner.
    pub fn matching(&self, path: &str) -> Option<(&str, &str)> {
        self.entries
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .last()
            .map(|(prefix, upstream)| (prefix.as_str(), upstream.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> ProxyTable {
        ProxyTable::new(
            entries
                .iter()
                .map(|(p, u)| (p.to_string(), u.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_longest_prefix_wins() {
        let proxies = table(&[
            ("/api", "http://localhost:9000"),
            ("/api/v2", "http://localhost:9002"),
        ]);

        assert_eq!(
            proxies.matching("/api/v2/users"),
            Some(("/api/v2", "http://localhost:9002"))
        );
        assert_eq!(
            proxies.matching("/api/users"),
            Some(("/api", "http://localhost:9000"))
        );
        assert_eq!(proxies.matching("/assets/app.js"), None);
    }

    #[test]
    fn test_new_requires_workspace() {
        let project = tempfile::tempdir().unwrap();
        let config = ServerConfig::default();

        let err = Compilation::new(&config, project.path()).unwrap_err();
        assert!(matches!(err, CompilationError::MissingWorkspace { .. }));

        std::fs::create_dir(project.path().join("src")).unwrap();
        let compilation = Compilation::new(&config, project.path()).unwrap();
        assert!(compilation.workspace_directory.is_absolute());
        assert_eq!(compilation.output_directory, project.path().join("public"));
        assert!(compilation.plugins.iter().all(|p| p.built_in));
    }
}
