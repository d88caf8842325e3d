//! Resolve, serve and intercept expressed as [`Stage`]s.

use async_trait::async_trait;
use url::Url;

use crate::pipeline::fold::Stage;
use crate::pipeline::{RequestDescriptor, ResponseAccumulator};
use crate::resource::{Capability, Resource, ResourceError};

/// Rewrites the request URL.
pub struct ResolveStage;

#[async_trait]
impl Stage for ResolveStage {
    type Acc = Url;
    const CAPABILITY: Capability = Capability::Resolve;

    async fn applies(&self, resource: &dyn Resource, url: &Url) -> bool {
        resource.should_resolve(url).await
    }

    async fn apply(&self, resource: &dyn Resource, url: Url) -> Result<Url, ResourceError> {
        resource.resolve(url).await
    }
}

/// Produces the response draft for a resolved request.
pub struct ServeStage<'a> {
    pub request: &'a RequestDescriptor,
}

#[async_trait]
impl<'a> Stage for ServeStage<'a> {
    type Acc = ResponseAccumulator;
    const CAPABILITY: Capability = Capability::Serve;

    async fn applies(&self, resource: &dyn Resource, acc: &ResponseAccumulator) -> bool {
        let ctx = self.request.context(&acc.headers);
        resource.should_serve(&self.request.url, &ctx).await
    }

    async fn apply(
        &self,
        resource: &dyn Resource,
        acc: ResponseAccumulator,
    ) -> Result<ResponseAccumulator, ResourceError> {
        let partial = {
            let ctx = self.request.context(&acc.headers);
            resource.serve(&self.request.url, &ctx).await?
        };
        Ok(acc.merge(partial))
    }
}

/// Rewrites the served response.
pub struct InterceptStage<'a> {
    pub request: &'a RequestDescriptor,
}

#[async_trait]
impl<'a> Stage for InterceptStage<'a> {
    type Acc = ResponseAccumulator;
    const CAPABILITY: Capability = Capability::Intercept;

    async fn applies(&self, resource: &dyn Resource, acc: &ResponseAccumulator) -> bool {
        let ctx = self.request.context(&acc.headers);
        resource
            .should_intercept(&self.request.url, acc.body.as_ref(), &ctx)
            .await
    }

    async fn apply(
        &self,
        resource: &dyn Resource,
        acc: ResponseAccumulator,
    ) -> Result<ResponseAccumulator, ResourceError> {
        let partial = {
            let ctx = self.request.context(&acc.headers);
            resource
                .intercept(&self.request.url, acc.body.as_ref(), &ctx)
                .await?
        };
        Ok(acc.merge(partial))
    }
}
