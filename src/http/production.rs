//! Production server over the build output directory.
//!
//! # Routing
//! ```text
//! path ends in "/" or ".html"   → HTML from the output directory
//!                                 (SPA mode: always index.html)
//! .js .css images fonts .ico    → file from the output directory
//! .json                         → parsed and re-serialized
//! anything else but "/"         → dev proxy table, if a prefix matches
//! otherwise                     → 404
//! ```
//!
//! No resource pipeline runs here; only the proxy resource is reused.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use std::path::{Path, PathBuf};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::compilation::Compilation;
use crate::config::{Mode, ServerConfig};
use crate::http::content_type;
use crate::http::request::{into_descriptor, relative_path, MakeRequestUuidV4, X_REQUEST_ID};
use crate::observability::metrics;
use crate::pipeline::{RequestDescriptor, ResponseAccumulator};
use crate::resource::builtin::dev_proxy::DevProxyResource;
use crate::resource::{Resource, ResourceError};

struct ProdState {
    compilation: Arc<Compilation>,
    proxy: DevProxyResource,
    authority: String,
    max_body_bytes: usize,
}

/// Static server for a finished build.
pub struct ProdServer {
    router: Router,
}

impl ProdServer {
    pub fn new(config: &ServerConfig, compilation: Compilation) -> Self {
        let compilation = Arc::new(compilation);
        let state = Arc::new(ProdState {
            proxy: DevProxyResource::new(compilation.clone()),
            compilation,
            authority: config.prod_server.bind_address.clone(),
            max_body_bytes: config.dev_server.max_body_bytes,
        });

        Self {
            router: Self::build_router(config, state),
        }
    }

    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: Arc<ProdState>) -> Router {
        Router::new()
            .route("/", any(production_handler))
            .route("/{*path}", any(production_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.dev_server.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Production server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Production server stopped");
        Ok(())
    }
}

async fn production_handler(
    State(state): State<Arc<ProdState>>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    let response = match into_descriptor(request, &state.authority, state.max_body_bytes).await {
        Ok(descriptor) => serve_output(&state, &descriptor)
            .await
            .unwrap_or_else(|e| e.into_response()),
        Err(e) => e.into_response(),
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

async fn serve_output(
    state: &ProdState,
    request: &RequestDescriptor,
) -> Result<Response, ResourceError> {
    let path = request.url.path();
    let output = &state.compilation.output_directory;

    if path.ends_with('/') || path.ends_with(".html") {
        let page = match state.compilation.mode {
            Mode::Spa => "/index.html".to_string(),
            _ if path.ends_with('/') => format!("{path}index.html"),
            _ => path.to_string(),
        };
        return match output_file(output, &page) {
            Some(file) => file_response(&file, "text/html").await,
            None => Ok(StatusCode::NOT_FOUND.into_response()),
        };
    }

    if let (Some(extension), Some(file)) = (extension(path), output_file(output, path)) {
        if extension == "json" {
            return json_response(&file).await;
        }
        if let Some(mime) = content_type::from_extension(&extension) {
            return file_response(&file, mime).await;
        }
    }

    if path != "/" {
        let response_headers = HeaderMap::new();
        let ctx = request.context(&response_headers);
        if state.proxy.should_serve(&request.url, &ctx).await {
            let proxied = state.proxy.serve(&request.url, &ctx).await?;
            return Ok(ResponseAccumulator::default()
                .merge(proxied)
                .commit()
                .into_response());
        }
    }

    Ok(StatusCode::NOT_FOUND.into_response())
}

fn extension(url_path: &str) -> Option<String> {
    Path::new(url_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn output_file(output: &Path, url_path: &str) -> Option<PathBuf> {
    relative_path(url_path).map(|relative| output.join(relative))
}

async fn file_response(path: &Path, mime: &'static str) -> Result<Response, ResourceError> {
    let body = tokio::fs::read(path)
        .await
        .map_err(|e| ResourceError::io(path, e))?;
    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static(mime))],
        body,
    )
        .into_response())
}

async fn json_response(path: &Path) -> Result<Response, ResourceError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ResourceError::io(path, e))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|source| ResourceError::MalformedJson {
            context: path.display().to_string(),
            source,
        })?;
    Ok(Json(value).into_response())
}
