//! Resources shipped with the server, in registration order.

pub mod dev_proxy;
pub mod standard;
pub mod workspace;

pub use dev_proxy::DevProxyResource;
pub use standard::StandardFileResource;
pub use workspace::UserWorkspaceResource;

use crate::resource::registry::PluginDescriptor;

/// Descriptors for every built-in resource.
pub fn descriptors() -> Vec<PluginDescriptor> {
    vec![
        PluginDescriptor::built_in_resource(workspace::NAME, UserWorkspaceResource::new),
        PluginDescriptor::built_in_resource(standard::NAME, |_| StandardFileResource::new()),
        PluginDescriptor::built_in_resource(dev_proxy::NAME, DevProxyResource::new),
    ]
}
