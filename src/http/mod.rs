//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout, request ID, tracing)
//!     → request.rs (buffer body, build RequestDescriptor)
//!     → [pipeline: resolve → serve → intercept]
//!     → response.rs (accumulator or error → HTTP response)
//!     → Send to client
//! ```
//!
//! production.rs serves a finished build and bypasses the pipeline.

pub mod content_type;
pub mod production;
pub mod request;
pub mod response;
pub mod server;

pub use production::ProdServer;
pub use request::X_REQUEST_ID;
pub use server::DevServer;
