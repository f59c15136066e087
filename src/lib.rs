//! Connectivity health-check library.
//!
//! Probes a radio backend the way its web client reaches it: one JSON
//! request/response fetch and one WebSocket handshake, run side by side and
//! reported as a single result.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod report;

pub use config::CheckerConfig;
pub use health::{Endpoints, HealthCheckResult, HealthCheckRunner, ProbeOutcome};
pub use lifecycle::Shutdown;
