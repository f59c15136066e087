//! Result rendering for the terminal.
//!
//! Turns a [`HealthCheckResult`] into either a human-readable report or a
//! JSON document. No probing decisions are made here.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write;

use crate::health::{Endpoints, HealthCheckResult, ProbeKind, ProbeOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    endpoints: &'a Endpoints,
    passed: bool,
    #[serde(flatten)]
    result: &'a HealthCheckResult,
}

/// Render `result` for the given endpoints.
pub fn render(result: &HealthCheckResult, endpoints: &Endpoints, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(result, endpoints),
        OutputFormat::Json => render_json(result, endpoints),
    }
}

fn render_json(result: &HealthCheckResult, endpoints: &Endpoints) -> String {
    let report = JsonReport {
        endpoints,
        passed: result.all_passed(),
        result,
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

fn render_text(result: &HealthCheckResult, endpoints: &Endpoints) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Connectivity check");
    let _ = writeln!(out, "  API URL:       {}", endpoints.request_url);
    let _ = writeln!(out, "  WebSocket URL: {}", endpoints.stream_url);
    let _ = writeln!(out);

    if result.is_running {
        let _ = writeln!(out, "Running tests...");
        return out;
    }

    write_probe(&mut out, ProbeKind::Request, result.request_probe.as_ref());
    write_probe(&mut out, ProbeKind::Stream, result.stream_probe.as_ref());

    let hints = hints(result);
    if !hints.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Troubleshooting:");
        for hint in hints {
            let _ = writeln!(out, "  - {}", hint);
        }
    }
    out
}

fn write_probe(out: &mut String, kind: ProbeKind, outcome: Option<&ProbeOutcome>) {
    let Some(outcome) = outcome else {
        let _ = writeln!(out, "[----] {}: not run", kind.title());
        return;
    };

    let mark = if outcome.succeeded() { "PASS" } else { "FAIL" };
    let _ = writeln!(
        out,
        "[{}] {}: {} ({} ms)",
        mark,
        kind.title(),
        outcome.message(),
        outcome.elapsed().as_millis()
    );

    if let Some(detail) = outcome.detail() {
        let _ = writeln!(out, "       Error: {}", detail);
    }
    if let Some(payload) = outcome.payload() {
        let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
        for line in pretty.lines() {
            let _ = writeln!(out, "       {}", line);
        }
    }
}

fn hints(result: &HealthCheckResult) -> Vec<&'static str> {
    let failed = |probe: &Option<ProbeOutcome>| probe.as_ref().is_some_and(|p| !p.succeeded());
    let mut hints = Vec::new();

    if failed(&result.request_probe) {
        hints.push("Check that the backend server is running and reachable");
        hints.push("Verify the backend CORS configuration includes your origin");
    }
    if failed(&result.stream_probe) {
        hints.push("Check firewall and proxy settings for WebSocket upgrades");
    }
    hints
}
