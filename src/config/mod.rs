//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated)
//!     → Compilation (immutable, shared via Arc with every resource)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the server starts; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{DevServerConfig, Mode, ObservabilityConfig, ProdServerConfig, ServerConfig};
pub use validation::ValidationError;
