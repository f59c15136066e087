//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber's wait() resolves
//!     → watch loop stops scheduling runs → in-flight run aborted on drop
//! ```
//!
//! # Design Decisions
//! - Shutdown is level-triggered: subscribers created after the trigger
//!   still observe it
//! - Dropping the runner is the teardown; no separate drain phase

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
