//! Resource registry.
//!
//! # Responsibilities
//! - Instantiate every resource plugin exactly once per server
//! - Order them: built-ins first, then user plugins, each in declared order
//! - Check user plugins against the resource contract (warn, never reject)

use std::fmt;
use std::sync::Arc;

use crate::compilation::Compilation;
use crate::resource::{Capabilities, Resource};

/// Builds a resource instance from the shared compilation.
pub type ResourceProvider = Arc<dyn Fn(Arc<Compilation>) -> Box<dyn Resource> + Send + Sync>;

/// What kind of plugin a descriptor registers.
///
/// Only `Resource` plugins take part in the request pipeline; the other kinds
/// belong to the build and are carried along untouched.
#[derive(Clone)]
pub enum PluginKind {
    Resource(ResourceProvider),
    Server,
    Rollup,
}

/// A plugin as declared in the compilation.
#[derive(Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub built_in: bool,
    pub kind: PluginKind,
}

impl PluginDescriptor {
    /// Declare a user resource plugin.
    pub fn resource<F, R>(name: impl Into<String>, provider: F) -> Self
    where
        F: Fn(Arc<Compilation>) -> R + Send + Sync + 'static,
        R: Resource + 'static,
    {
        Self {
            name: name.into(),
            built_in: false,
            kind: PluginKind::Resource(Arc::new(move |compilation| {
                Box::new(provider(compilation)) as Box<dyn Resource>
            })),
        }
    }

    /// Declare a resource plugin shipped with the server.
    pub(crate) fn built_in_resource<F, R>(name: impl Into<String>, provider: F) -> Self
    where
        F: Fn(Arc<Compilation>) -> R + Send + Sync + 'static,
        R: Resource + 'static,
    {
        Self {
            built_in: true,
            ..Self::resource(name, provider)
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self.kind, PluginKind::Resource(_))
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            PluginKind::Resource(_) => "resource",
            PluginKind::Server => "server",
            PluginKind::Rollup => "rollup",
        };
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("built_in", &self.built_in)
            .field("kind", &kind)
            .finish()
    }
}

/// An instantiated resource together with its cached capabilities.
pub struct RegisteredResource {
    name: String,
    built_in: bool,
    capabilities: Capabilities,
    handler: Box<dyn Resource>,
}

impl RegisteredResource {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_built_in(&self) -> bool {
        self.built_in
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn handler(&self) -> &dyn Resource {
        self.handler.as_ref()
    }
}

impl fmt::Debug for RegisteredResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredResource")
            .field("name", &self.name)
            .field("built_in", &self.built_in)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// The ordered list of resource instances for one server.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: Vec<RegisteredResource>,
}

impl ResourceRegistry {
    /// Instantiate every resource plugin of `compilation`.
    pub fn from_compilation(compilation: &Compilation) -> Self {
        // Resources get their own snapshot; nothing they hold can reach back
        // into the caller's value.
        let shared = Arc::new(compilation.clone());

        let built_ins = compilation.plugins.iter().filter(|p| p.built_in);
        let user = compilation.plugins.iter().filter(|p| !p.built_in);

        let resources = built_ins
            .chain(user)
            .filter_map(|descriptor| match &descriptor.kind {
                PluginKind::Resource(provider) => {
                    Some(instantiate(descriptor, provider, Arc::clone(&shared)))
                }
                _ => None,
            })
            .collect::<Vec<_>>();

        tracing::info!(
            resources = resources.len(),
            names = ?resources.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "Resource registry built"
        );

        Self { resources }
    }

    /// Build a registry from already instantiated resources, in order.
    pub fn from_resources<I>(resources: I) -> Self
    where
        I: IntoIterator<Item = (String, Box<dyn Resource>)>,
    {
        Self {
            resources: resources
                .into_iter()
                .map(|(name, handler)| RegisteredResource {
                    capabilities: handler.capabilities(),
                    name,
                    built_in: false,
                    handler,
                })
                .collect(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegisteredResource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }
}

fn instantiate(
    descriptor: &PluginDescriptor,
    provider: &ResourceProvider,
    compilation: Arc<Compilation>,
) -> RegisteredResource {
    let handler = provider(compilation);
    let capabilities = handler.capabilities();

    if !descriptor.built_in {
        let missing = capabilities.missing();
        if !missing.is_empty() {
            tracing::warn!(
                plugin = %descriptor.name,
                missing = ?missing.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
                "Resource plugin does not implement the full resource contract; missing capabilities pass through"
            );
        }
    }

    RegisteredResource {
        name: descriptor.name.clone(),
        built_in: descriptor.built_in,
        capabilities,
        handler,
    }
}
