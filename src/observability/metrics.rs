//! Metrics collection and exposition.
//!
//! # Metrics
//! - `connectivity_probe_total` (counter): settled probes by probe, result
//! - `connectivity_probe_duration_seconds` (histogram): time to settlement
//! - `connectivity_probe_up` (gauge): 1=last probe passed, 0=failed
//! - `connectivity_probe_failures_total` (counter): failures by probe, class

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

use crate::health::ProbeOutcome;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one settled probe.
pub fn record_probe(outcome: &ProbeOutcome) {
    let probe = outcome.probe().label();
    let result = if outcome.succeeded() { "success" } else { "failure" };

    ::metrics::counter!("connectivity_probe_total", "probe" => probe, "result" => result).increment(1);
    ::metrics::histogram!("connectivity_probe_duration_seconds", "probe" => probe)
        .record(outcome.elapsed().as_secs_f64());
    ::metrics::gauge!("connectivity_probe_up", "probe" => probe)
        .set(if outcome.succeeded() { 1.0 } else { 0.0 });
}

/// Record a failure class alongside the generic counters.
pub fn record_failure_class(probe: &'static str, class: &'static str) {
    ::metrics::counter!("connectivity_probe_failures_total", "probe" => probe, "class" => class)
        .increment(1);
}
