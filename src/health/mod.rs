//! Connectivity health-check subsystem.
//!
//! # Data Flow
//! ```text
//! HealthCheckRunner::run(endpoints)
//!     → publish running snapshot (watch channel)
//!     → spawn:
//!         request.rs  GET request_url  ──┐
//!         stream.rs   WS handshake     ──┤ join
//!                                        ▼
//!     → publish aggregate HealthCheckResult
//!
//! Stream probe (stream.rs + handshake.rs):
//!     dial → select { next event, 10s deadline }
//!     → first terminal event settles the handshake
//!     → close connection → ProbeOutcome
//! ```
//!
//! # Design Decisions
//! - Probes are independent: neither observes or cancels the other
//! - Failures are values (ProbeOutcome), never errors returned to the caller
//! - Each run owns its sockets; nothing is pooled across runs

pub mod error;
pub mod handshake;
pub mod outcome;
pub mod request;
pub mod runner;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ProbeError;
pub use handshake::{Handshake, HandshakeState, StreamEvent};
pub use outcome::{Endpoints, HealthCheckResult, ProbeKind, ProbeOutcome};
pub use request::RequestProbe;
pub use runner::{HealthCheckRunner, RunHandle};
pub use stream::{probe_stream, ConnectionAttempt, StreamDialer, WebSocketDialer};
