//! Per-request state threaded through the pipeline.

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use url::Url;

use crate::resource::ExchangeContext;

/// An inbound request as the resources see it.
///
/// `url` is absolute (scheme, host, path and query) and is the only field the
/// resolution stage rewrites. `original_url` keeps what the client asked for.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: Url,
    pub original_url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            original_url: url.clone(),
            url,
            method,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Exchange context pairing this request with the response headers so far.
    pub fn context<'a>(&'a self, response_headers: &'a HeaderMap) -> ExchangeContext<'a> {
        ExchangeContext {
            method: &self.method,
            original_url: &self.original_url,
            request_headers: &self.headers,
            request_body: &self.body,
            response_headers,
        }
    }
}
