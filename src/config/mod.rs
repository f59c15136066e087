//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! connectivity.toml (optional)
//!     → loader.rs (parse, apply CONNCHECK_* env overrides)
//!     → loader::finalize (apply --api-url/--ws-url, then validation.rs)
//!     → CheckerConfig (validated, immutable)
//!     → CheckerConfig::endpoints() → Endpoints handed to the runner
//!
//! In watch mode:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → loader::finalize re-applies CLI overrides and validates
//!     → new config sent over a channel, next run uses it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults, a missing file is not an error
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use schema::CheckerConfig;
pub use schema::EndpointConfig;
pub use schema::Environment;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ProbeConfig;
pub use schema::WatchConfig;
