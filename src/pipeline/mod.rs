//! Three-stage request pipeline.
//!
//! # Data Flow
//! ```text
//! RequestDescriptor (absolute URL, method, headers, body)
//!     → resolve   (fold URL through every resource)
//!     → serve     (fold a fresh ResponseAccumulator, commit content type)
//!     → intercept (fold the served accumulator)
//!     → ResponseAccumulator handed to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - All three stages share one fold (fold.rs): no short-circuit, per-field
//!   last-writer-wins merge
//! - Resolution is order-dependent on purpose: a later resource sees and may
//!   rewrite (or undo) what an earlier one produced
//! - Stage N never starts before stage N-1 finished for the same request
//! - A failing action ends the request; nothing is retried

pub mod error;
pub mod fold;
pub mod request;
pub mod response;
pub mod stages;

use url::Url;

use crate::compilation::Compilation;
use crate::resource::ResourceRegistry;

pub use error::PipelineError;
pub use request::RequestDescriptor;
pub use response::ResponseAccumulator;

use self::fold::fold;
use self::stages::{InterceptStage, ResolveStage, ServeStage};

/// The ordered resources of one server and the stages run over them.
#[derive(Debug)]
pub struct Pipeline {
    registry: ResourceRegistry,
}

impl Pipeline {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self { registry }
    }

    /// Instantiate every resource plugin of `compilation`.
    pub fn from_compilation(compilation: &Compilation) -> Self {
        Self::new(ResourceRegistry::from_compilation(compilation))
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Resolution stage.
    pub async fn resolve(&self, url: Url) -> Result<Url, PipelineError> {
        fold(&ResolveStage, &self.registry, url).await
    }

    /// Serve stage, seeded with whatever the response already holds.
    pub async fn serve(
        &self,
        request: &RequestDescriptor,
        seed: ResponseAccumulator,
    ) -> Result<ResponseAccumulator, PipelineError> {
        fold(&ServeStage { request }, &self.registry, seed).await
    }

    /// Intercept stage over a served response.
    pub async fn intercept(
        &self,
        request: &RequestDescriptor,
        served: ResponseAccumulator,
    ) -> Result<ResponseAccumulator, PipelineError> {
        fold(&InterceptStage { request }, &self.registry, served).await
    }

    /// Run resolve, serve and intercept for one request.
    pub async fn handle(
        &self,
        mut request: RequestDescriptor,
    ) -> Result<ResponseAccumulator, PipelineError> {
        request.url = self.resolve(request.url.clone()).await?;

        tracing::debug!(
            method = %request.method,
            url = %request.original_url,
            resolved = %request.url,
            "Request resolved"
        );

        let served = self
            .serve(&request, ResponseAccumulator::default())
            .await?
            .commit();
        self.intercept(&request, served).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{
        Capabilities, ExchangeContext, Resource, ResourceError, ResourceResponse,
    };
    use async_trait::async_trait;
    use axum::http::{header, Method};
    use bytes::Bytes;

    /// Sets the URL path to a fixed value.
    struct SetPath(&'static str);

    #[async_trait]
    impl Resource for SetPath {
        fn capabilities(&self) -> Capabilities {
            Capabilities::RESOLVE
        }

        async fn should_resolve(&self, _url: &Url) -> bool {
            true
        }

        async fn resolve(&self, mut url: Url) -> Result<Url, ResourceError> {
            url.set_path(self.0);
            Ok(url)
        }
    }

    /// Appends a segment to the URL path.
    struct AppendPath(&'static str);

    #[async_trait]
    impl Resource for AppendPath {
        fn capabilities(&self) -> Capabilities {
            Capabilities::RESOLVE
        }

        async fn should_resolve(&self, _url: &Url) -> bool {
            true
        }

        async fn resolve(&self, mut url: Url) -> Result<Url, ResourceError> {
            let path = format!("{}{}", url.path().trim_end_matches('/'), self.0);
            url.set_path(&path);
            Ok(url)
        }
    }

    /// Serves fixed fields for every URL.
    struct Fixed(ResourceResponse);

    #[async_trait]
    impl Resource for Fixed {
        fn capabilities(&self) -> Capabilities {
            Capabilities::SERVE
        }

        async fn should_serve(&self, _url: &Url, _ctx: &ExchangeContext<'_>) -> bool {
            true
        }

        async fn serve(
            &self,
            _url: &Url,
            _ctx: &ExchangeContext<'_>,
        ) -> Result<ResourceResponse, ResourceError> {
            Ok(self.0.clone())
        }
    }

    /// Appends a marker to whatever body was served.
    struct Marker(&'static str);

    #[async_trait]
    impl Resource for Marker {
        fn capabilities(&self) -> Capabilities {
            Capabilities::INTERCEPT
        }

        async fn should_intercept(
            &self,
            _url: &Url,
            body: Option<&Bytes>,
            _ctx: &ExchangeContext<'_>,
        ) -> bool {
            body.is_some()
        }

        async fn intercept(
            &self,
            _url: &Url,
            body: Option<&Bytes>,
            _ctx: &ExchangeContext<'_>,
        ) -> Result<ResourceResponse, ResourceError> {
            let mut text = body
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default();
            text.push_str(self.0);
            Ok(ResourceResponse::new().with_body(text))
        }
    }

    /// Records the content type it saw in the response headers.
    struct SeesContentType;

    #[async_trait]
    impl Resource for SeesContentType {
        fn capabilities(&self) -> Capabilities {
            Capabilities::INTERCEPT
        }

        async fn should_intercept(
            &self,
            _url: &Url,
            _body: Option<&Bytes>,
            ctx: &ExchangeContext<'_>,
        ) -> bool {
            ctx.response_headers.contains_key(header::CONTENT_TYPE)
        }

        async fn intercept(
            &self,
            _url: &Url,
            _body: Option<&Bytes>,
            ctx: &ExchangeContext<'_>,
        ) -> Result<ResourceResponse, ResourceError> {
            let seen = ctx.response_headers[header::CONTENT_TYPE]
                .to_str()
                .unwrap_or_default()
                .to_string();
            Ok(ResourceResponse::new().with_body(format!("saw {seen}")))
        }
    }

    /// Drops the query string.
    struct StripQuery;

    #[async_trait]
    impl Resource for StripQuery {
        fn capabilities(&self) -> Capabilities {
            Capabilities::RESOLVE
        }

        async fn should_resolve(&self, url: &Url) -> bool {
            url.query().is_some()
        }

        async fn resolve(&self, mut url: Url) -> Result<Url, ResourceError> {
            url.set_query(None);
            Ok(url)
        }
    }

    /// Serves the URL the client asked for next to the resolved one.
    struct EchoOriginal;

    #[async_trait]
    impl Resource for EchoOriginal {
        fn capabilities(&self) -> Capabilities {
            Capabilities::SERVE
        }

        async fn should_serve(&self, _url: &Url, _ctx: &ExchangeContext<'_>) -> bool {
            true
        }

        async fn serve(
            &self,
            url: &Url,
            ctx: &ExchangeContext<'_>,
        ) -> Result<ResourceResponse, ResourceError> {
            Ok(ResourceResponse::new().with_body(format!("{} {}", ctx.original_url, url)))
        }
    }

    /// Fails its serve action.
    struct Broken;

    #[async_trait]
    impl Resource for Broken {
        fn capabilities(&self) -> Capabilities {
            Capabilities::SERVE
        }

        async fn should_serve(&self, _url: &Url, _ctx: &ExchangeContext<'_>) -> bool {
            true
        }

        async fn serve(
            &self,
            _url: &Url,
            _ctx: &ExchangeContext<'_>,
        ) -> Result<ResourceResponse, ResourceError> {
            Err(ResourceError::custom("disk on fire"))
        }
    }

    fn boxed<R: Resource + 'static>(resource: R) -> Box<dyn Resource> {
        Box::new(resource)
    }

    fn pipeline(resources: Vec<(&str, Box<dyn Resource>)>) -> Pipeline {
        Pipeline::new(ResourceRegistry::from_resources(
            resources.into_iter().map(|(n, r)| (n.to_string(), r)),
        ))
    }

    fn request(path: &str) -> RequestDescriptor {
        let url = Url::parse("http://localhost:1984").unwrap().join(path).unwrap();
        RequestDescriptor::new(Method::GET, url)
    }

    #[tokio::test]
    async fn test_resolution_is_order_dependent() {
        let forward = pipeline(vec![
            ("set", boxed(SetPath("/workspace"))),
            ("append", boxed(AppendPath("/index.html"))),
        ]);
        let reverse = pipeline(vec![
            ("append", boxed(AppendPath("/index.html"))),
            ("set", boxed(SetPath("/workspace"))),
        ]);

        let url = request("/").url;
        let a = forward.resolve(url.clone()).await.unwrap();
        let b = reverse.resolve(url).await.unwrap();

        assert_eq!(a.path(), "/workspace/index.html");
        // The later resource undoes the earlier rewrite.
        assert_eq!(b.path(), "/workspace");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_serve_sees_url_before_resolution() {
        let pipeline = pipeline(vec![
            ("strip", boxed(StripQuery)),
            ("echo", boxed(EchoOriginal)),
        ]);

        let response = pipeline.handle(request("/blog/?page=2")).await.unwrap();
        assert_eq!(
            response.body_text(),
            "http://localhost:1984/blog/?page=2 http://localhost:1984/blog/"
        );
    }

    #[tokio::test]
    async fn test_last_content_type_wins() {
        let pipeline = pipeline(vec![
            (
                "html",
                boxed(Fixed(
                    ResourceResponse::new()
                        .with_body("<p>hi</p>")
                        .with_content_type("text/html"),
                )),
            ),
            ("body-only", boxed(Fixed(ResourceResponse::new().with_body("replaced")))),
        ]);

        let response = pipeline.handle(request("/")).await.unwrap();
        assert_eq!(response.body_text(), "replaced");
        assert_eq!(response.content_type.as_deref(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_content_type_undefined_when_never_set() {
        let pipeline = pipeline(vec![(
            "body-only",
            boxed(Fixed(ResourceResponse::new().with_body("plain"))),
        )]);

        let response = pipeline.handle(request("/")).await.unwrap();
        assert_eq!(response.content_type, None);
        assert!(response.headers.get(header::CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn test_intercepts_apply_in_registration_order() {
        let pipeline = pipeline(vec![
            ("page", boxed(Fixed(ResourceResponse::new().with_body("page")))),
            ("a", boxed(Marker("<!-- A -->"))),
            ("b", boxed(Marker("<!-- B -->"))),
        ]);

        let body = pipeline.handle(request("/")).await.unwrap().body_text();
        assert_eq!(body, "page<!-- A --><!-- B -->");
    }

    #[tokio::test]
    async fn test_intercept_passes_through_when_nobody_intercepts() {
        let pipeline = pipeline(vec![(
            "page",
            boxed(Fixed(
                ResourceResponse::new()
                    .with_body("page")
                    .with_content_type("text/html"),
            )),
        )]);
        let request = request("/");

        let served = pipeline
            .serve(&request, ResponseAccumulator::default())
            .await
            .unwrap()
            .commit();
        let intercepted = pipeline.intercept(&request, served.clone()).await.unwrap();
        assert_eq!(intercepted, served);
    }

    #[tokio::test]
    async fn test_intercept_sees_committed_content_type() {
        let pipeline = pipeline(vec![
            (
                "page",
                boxed(Fixed(
                    ResourceResponse::new()
                        .with_body("page")
                        .with_content_type("text/html"),
                )),
            ),
            ("observer", boxed(SeesContentType)),
        ]);

        let body = pipeline.handle(request("/")).await.unwrap().body_text();
        assert_eq!(body, "saw text/html");
    }

    #[tokio::test]
    async fn test_serve_is_idempotent() {
        let pipeline = pipeline(vec![
            ("page", boxed(Fixed(ResourceResponse::new().with_body("page")))),
            ("type", boxed(Fixed(ResourceResponse::new().with_content_type("text/plain")))),
        ]);
        let request = request("/about");

        let first = pipeline
            .serve(&request, ResponseAccumulator::default())
            .await
            .unwrap();
        let second = pipeline
            .serve(&request, ResponseAccumulator::default())
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failure_aborts_only_that_request() {
        let pipeline = pipeline(vec![
            ("page", boxed(Fixed(ResourceResponse::new().with_body("page")))),
            ("broken", boxed(Broken)),
            ("a", boxed(Marker("A"))),
        ]);

        let err = pipeline.handle(request("/")).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Resource { ref resource, .. } if resource == "broken"
        ));
        assert!(err.to_string().contains("disk on fire"));

        // The registry is untouched; the next request fails the same way rather than
        // carrying state over.
        assert!(pipeline.handle(request("/")).await.is_err());
    }
}
