//! Serves files that an earlier resource resolved to a `file:` URL.

use async_trait::async_trait;
use std::path::PathBuf;
use url::Url;

use crate::http::content_type;
use crate::resource::{Capabilities, ExchangeContext, Resource, ResourceError, ResourceResponse};

pub const NAME: &str = "plugin-standard-files";

#[derive(Debug, Default)]
pub struct StandardFileResource;

impl StandardFileResource {
    pub fn new() -> Self {
        Self
    }

    /// File to read for a `file:` URL; directories map to their `index.html`.
    async fn target(url: &Url) -> Option<PathBuf> {
        if url.scheme() != "file" {
            return None;
        }
        let path = url.to_file_path().ok()?;
        let metadata = tokio::fs::metadata(&path).await.ok()?;

        if metadata.is_file() {
            return Some(path);
        }
        let index = path.join("index.html");
        match tokio::fs::metadata(&index).await {
            Ok(m) if m.is_file() => Some(index),
            _ => None,
        }
    }
}

#[async_trait]
impl Resource for StandardFileResource {
    fn capabilities(&self) -> Capabilities {
        Capabilities::SERVE
    }

    async fn should_serve(&self, url: &Url, _ctx: &ExchangeContext<'_>) -> bool {
        Self::target(url).await.is_some()
    }

    async fn serve(
        &self,
        url: &Url,
        _ctx: &ExchangeContext<'_>,
    ) -> Result<ResourceResponse, ResourceError> {
        let path = Self::target(url)
            .await
            .ok_or_else(|| ResourceError::InvalidUrl(format!("{url} does not name a file")))?;
        let body = tokio::fs::read(&path)
            .await
            .map_err(|e| ResourceError::io(&path, e))?;

        let mut response = ResourceResponse::new().with_body(body);
        if let Some(mime) = content_type::from_path(&path) {
            response = response.with_content_type(mime);
        }
        Ok(response)
    }
}
