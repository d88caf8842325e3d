//! Development and production servers for a static site workspace.
//!
//! Every dev server request is carried through an ordered list of resource
//! plugins in three stages: resolve the URL, serve a body, intercept the
//! served body.

pub mod compilation;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod resource;

pub use compilation::{Compilation, CompilationError};
pub use config::ServerConfig;
pub use http::{DevServer, ProdServer};
pub use lifecycle::Shutdown;
pub use pipeline::{Pipeline, PipelineError};
pub use resource::{PluginDescriptor, Resource, ResourceError};
