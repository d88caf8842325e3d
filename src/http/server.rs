//! Development server.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (timeout, request ID, tracing)
//! - Carry every request through the resource pipeline
//! - Stop accepting on shutdown and drain in-flight requests

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
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
use crate::config::ServerConfig;
use crate::http::request::{into_descriptor, request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::observability::metrics;
use crate::pipeline::{Pipeline, PipelineError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub authority: Arc<str>,
    pub max_body_bytes: usize,
}

/// HTTP server running the resource pipeline for every request.
pub struct DevServer {
    router: Router,
    pipeline: Arc<Pipeline>,
}

impl DevServer {
    /// Instantiate the compilation's resources and build the router.
    pub fn new(config: &ServerConfig, compilation: Compilation) -> Self {
        let pipeline = Arc::new(Pipeline::from_compilation(&compilation));
        let state = AppState {
            pipeline: pipeline.clone(),
            authority: Arc::from(config.dev_server.bind_address.as_str()),
            max_body_bytes: config.dev_server.max_body_bytes,
        };

        let router = Self::build_router(config, state);
        Self { router, pipeline }
    }

    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(develop_handler))
            .route("/{*path}", any(develop_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.dev_server.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
            .layer(TraceLayer::new_for_http())
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            resources = ?self.pipeline.registry().names(),
            "Development server listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Development server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method and path goes through the pipeline.
async fn develop_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Handling request"
    );

    let result = match into_descriptor(request, &state.authority, state.max_body_bytes).await {
        // Detached so resource actions finish even if the client goes away.
        Ok(descriptor) => {
            let pipeline = state.pipeline.clone();
            tokio::spawn(async move { pipeline.handle(descriptor).await })
                .await
                .unwrap_or_else(|e| Err(PipelineError::Aborted(e.to_string())))
        }
        Err(e) => Err(e),
    };

    let response = match result {
        Ok(accumulator) => accumulator.into_response(),
        Err(e) => e.into_response(),
    };

    let status = response.status();
    metrics::record_request(method.as_str(), status.as_u16(), start);
    tracing::debug!(
        request_id = %request_id,
        status = status.as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request complete"
    );
    response
}
