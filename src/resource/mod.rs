//! Resource plugins: the unit of extension of the request pipeline.
//!
//! # Data Flow
//! ```text
//! Compilation.plugins (built-ins first, then user plugins)
//!     → registry.rs (instantiate once, cache capabilities, warn on gaps)
//!     → pipeline (resolve → serve → intercept over the ordered list)
//! ```
//!
//! # Design Decisions
//! - A resource declares the capabilities it implements; undeclared ones are
//!   never consulted by the pipeline
//! - Every capability is a predicate + action pair with pass-through defaults
//! - Resources only talk to each other through the pipeline's accumulator

pub mod builtin;
pub mod error;
pub mod registry;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use std::fmt;
use url::Url;

pub use error::ResourceError;
pub use registry::{PluginDescriptor, PluginKind, RegisteredResource, ResourceRegistry};

/// One of the three things a resource can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Resolve,
    Serve,
    Intercept,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Resolve, Capability::Serve, Capability::Intercept];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Resolve => "resolve",
            Capability::Serve => "serve",
            Capability::Intercept => "intercept",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of capabilities a resource implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub resolve: bool,
    pub serve: bool,
    pub intercept: bool,
}

impl Capabilities {
    pub const NONE: Self = Self { resolve: false, serve: false, intercept: false };
    pub const RESOLVE: Self = Self { resolve: true, ..Self::NONE };
    pub const SERVE: Self = Self { serve: true, ..Self::NONE };
    pub const INTERCEPT: Self = Self { intercept: true, ..Self::NONE };
    pub const ALL: Self = Self { resolve: true, serve: true, intercept: true };

    /// Union of two sets.
    pub const fn with(self, other: Self) -> Self {
        Self {
            resolve: self.resolve || other.resolve,
            serve: self.serve || other.serve,
            intercept: self.intercept || other.intercept,
        }
    }

    pub fn contains(self, capability: Capability) -> bool {
        match capability {
            Capability::Resolve => self.resolve,
            Capability::Serve => self.serve,
            Capability::Intercept => self.intercept,
        }
    }

    /// Capabilities not in this set.
    pub fn missing(self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| !self.contains(*c))
            .collect()
    }
}

/// Request and response state visible to serve and intercept predicates and actions.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeContext<'a> {
    pub method: &'a Method,
    /// The request URL before resolution, query included.
    pub original_url: &'a Url,
    pub request_headers: &'a HeaderMap,
    pub request_body: &'a Bytes,
    /// Headers accumulated so far by earlier resources.
    pub response_headers: &'a HeaderMap,
}

/// Partial response produced by a serve or intercept action.
///
/// Fields left as `None` keep whatever the pipeline accumulated before.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceResponse {
    pub body: Option<Bytes>,
    pub content_type: Option<String>,
    pub headers: Option<HeaderMap>,
    pub status: Option<StatusCode>,
}

impl ResourceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

/// A resource plugin.
///
/// Implement only the capabilities you need and declare them in
/// [`capabilities`](Resource::capabilities); the defaults decline every
/// predicate and pass every value through untouched.
///
/// Predicates must not have effects other resources could observe. Actions
/// may do I/O. The pipeline never retries a failed action.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Capabilities this resource implements.
    fn capabilities(&self) -> Capabilities;

    async fn should_resolve(&self, _url: &Url) -> bool {
        false
    }

    /// Map a URL to a locator: a `file:` URL, a remote URL, or the input unchanged.
    async fn resolve(&self, url: Url) -> Result<Url, ResourceError> {
        Ok(url)
    }

    async fn should_serve(&self, _url: &Url, _ctx: &ExchangeContext<'_>) -> bool {
        false
    }

    async fn serve(
        &self,
        _url: &Url,
        _ctx: &ExchangeContext<'_>,
    ) -> Result<ResourceResponse, ResourceError> {
        Ok(ResourceResponse::default())
    }

    async fn should_intercept(
        &self,
        _url: &Url,
        _body: Option<&Bytes>,
        _ctx: &ExchangeContext<'_>,
    ) -> bool {
        false
    }

    async fn intercept(
        &self,
        _url: &Url,
        _body: Option<&Bytes>,
        _ctx: &ExchangeContext<'_>,
    ) -> Result<ResourceResponse, ResourceError> {
        Ok(ResourceResponse::default())
    }
}
