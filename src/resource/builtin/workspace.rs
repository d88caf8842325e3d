//! Resolves request URLs to files in the user's workspace.
//!
//! This is the default resolver: the root path always resolves, as does any
//! path that exists under the workspace directory.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use crate::compilation::Compilation;
use crate::http::request::relative_path;
use crate::resource::{Capabilities, Resource, ResourceError};

pub const NAME: &str = "plugin-user-workspace";

pub struct UserWorkspaceResource {
    compilation: Arc<Compilation>,
}

impl UserWorkspaceResource {
    pub fn new(compilation: Arc<Compilation>) -> Self {
        Self { compilation }
    }

    /// Workspace path for the URL's path, query and fragment ignored.
    fn workspace_path(&self, url: &Url) -> Option<PathBuf> {
        relative_path(url.path()).map(|relative| self.compilation.workspace_directory.join(relative))
    }
}

#[async_trait]
impl Resource for UserWorkspaceResource {
    fn capabilities(&self) -> Capabilities {
        Capabilities::RESOLVE
    }

    async fn should_resolve(&self, url: &Url) -> bool {
        if url.path() == "/" {
            return true;
        }
        match self.workspace_path(url) {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    async fn resolve(&self, url: Url) -> Result<Url, ResourceError> {
        let path = self
            .workspace_path(&url)
            .ok_or_else(|| ResourceError::InvalidUrl(format!("{url} escapes the workspace")))?;
        Url::from_file_path(&path)
            .map_err(|_| ResourceError::InvalidUrl(format!("{} is not an absolute path", path.display())))
    }
}
