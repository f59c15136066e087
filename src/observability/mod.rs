//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Probes and runner produce:
//!     → logging.rs (structured log events, one span per run)
//!     → metrics.rs (counters, gauges, histograms per probe)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, watch mode only)
//! ```
//!
//! # Design Decisions
//! - Logs go to stderr so reports on stdout stay machine-readable
//! - Run ID flows through every log line of a run
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
