//! Forwards requests matching the dev server proxy table to their upstream.
//!
//! # Design Decisions
//! - Only plain `http:` request URLs are proxied; anything already resolved
//!   to a file is left alone
//! - The full request path is appended to the upstream base
//! - `accept-encoding` is not forwarded and `content-encoding` is not returned,
//!   so the client never receives a body in an encoding it was not told about

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName};
use std::sync::Arc;
use url::Url;

use crate::compilation::Compilation;
use crate::http::response::strip_hop_by_hop;
use crate::resource::{Capabilities, ExchangeContext, Resource, ResourceError, ResourceResponse};

pub const NAME: &str = "plugin-dev-proxy";

/// Request headers never forwarded upstream.
const DROPPED_REQUEST_HEADERS: [HeaderName; 3] =
    [header::HOST, header::CONTENT_LENGTH, header::ACCEPT_ENCODING];

/// Response headers never returned to the client.
const DROPPED_RESPONSE_HEADERS: [HeaderName; 2] = [header::CONTENT_ENCODING, header::CONTENT_LENGTH];

pub struct DevProxyResource {
    compilation: Arc<Compilation>,
    client: reqwest::Client,
}

impl DevProxyResource {
    pub fn new(compilation: Arc<Compilation>) -> Self {
        Self {
            compilation,
            client: reqwest::Client::new(),
        }
    }

    /// Upstream URL for `url`, if the proxy table has a matching prefix.
    pub fn upstream_url(&self, url: &Url) -> Option<String> {
        let (_, upstream) = self.compilation.proxy_table.matching(url.path())?;
        let mut target = format!("{}{}", upstream.trim_end_matches('/'), url.path());
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }
        Some(target)
    }
}

#[async_trait]
impl Resource for DevProxyResource {
    fn capabilities(&self) -> Capabilities {
        Capabilities::SERVE
    }

    async fn should_serve(&self, url: &Url, _ctx: &ExchangeContext<'_>) -> bool {
        url.scheme() == "http" && self.compilation.proxy_table.matching(url.path()).is_some()
    }

    async fn serve(
        &self,
        url: &Url,
        ctx: &ExchangeContext<'_>,
    ) -> Result<ResourceResponse, ResourceError> {
        let target = self
            .upstream_url(url)
            .ok_or_else(|| ResourceError::InvalidUrl(format!("no proxy entry matches {url}")))?;

        let mut forwarded = ctx.request_headers.clone();
        strip_hop_by_hop(&mut forwarded);
        for name in &DROPPED_REQUEST_HEADERS {
            forwarded.remove(name);
        }

        tracing::debug!(method = %ctx.method, target = %target, "Proxying request upstream");

        let upstream_error = |source: reqwest::Error| ResourceError::Upstream {
            url: target.clone(),
            source,
        };
        let response = self
            .client
            .request(ctx.method.clone(), &target)
            .headers(forwarded)
            .body(ctx.request_body.clone())
            .send()
            .await
            .map_err(upstream_error)?;

        let status = response.status();
        let mut headers: HeaderMap = response.headers().clone();
        strip_hop_by_hop(&mut headers);
        for name in &DROPPED_RESPONSE_HEADERS {
            headers.remove(name);
        }
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = response.bytes().await.map_err(upstream_error)?;

        let mut proxied = ResourceResponse::new()
            .with_body(body)
            .with_status(status)
            .with_headers(headers);
        proxied.content_type = content_type;
        Ok(proxied)
    }
}
