//! Probe outcomes and the aggregate result published by the runner.

use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::health::error::ProbeError;

/// Concrete addresses probed by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoints {
    /// Target of the request/response probe.
    pub request_url: String,
    /// Target of the WebSocket handshake probe.
    pub stream_url: String,
}

/// Which probe produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Request,
    Stream,
}

impl ProbeKind {
    /// Label used in metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeKind::Request => "request",
            ProbeKind::Stream => "stream",
        }
    }

    /// Human-readable probe title.
    pub fn title(&self) -> &'static str {
        match self {
            ProbeKind::Request => "API Connectivity Test",
            ProbeKind::Stream => "WebSocket Connectivity Test",
        }
    }

    fn message(&self, succeeded: bool) -> &'static str {
        match (self, succeeded) {
            (ProbeKind::Request, true) => "API connectivity successful",
            (ProbeKind::Request, false) => "API connectivity failed",
            (ProbeKind::Stream, true) => "WebSocket connectivity successful",
            (ProbeKind::Stream, false) => "WebSocket connectivity failed",
        }
    }
}

/// Final, immutable result of one probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    probe: ProbeKind,
    succeeded: bool,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    elapsed: Duration,
}

impl ProbeOutcome {
    pub fn success(probe: ProbeKind, payload: Option<Value>, elapsed: Duration) -> Self {
        Self {
            probe,
            succeeded: true,
            message: probe.message(true),
            detail: None,
            payload,
            elapsed,
        }
    }

    pub fn failure(probe: ProbeKind, error: &ProbeError, elapsed: Duration) -> Self {
        Self {
            probe,
            succeeded: false,
            message: probe.message(false),
            detail: Some(error.to_string()),
            payload: None,
            elapsed,
        }
    }

    pub fn probe(&self) -> ProbeKind {
        self.probe
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn message(&self) -> &str {
        self.message
    }

    /// Failure cause; always present and non-empty when the probe failed.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Parsed response body of a successful request probe.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

fn as_millis<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// Snapshot of the most recent run.
///
/// A run starts with both outcomes absent and `is_running` set, and is
/// replaced wholesale by the populated value once both probes settle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheckResult {
    pub run_id: Uuid,
    pub request_probe: Option<ProbeOutcome>,
    pub stream_probe: Option<ProbeOutcome>,
    pub is_running: bool,
    /// Milliseconds since the Unix epoch.
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
}

impl HealthCheckResult {
    /// State before any run was triggered.
    pub fn idle() -> Self {
        Self {
            run_id: Uuid::nil(),
            request_probe: None,
            stream_probe: None,
            is_running: false,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn running(run_id: Uuid, started_at: u64) -> Self {
        Self {
            run_id,
            request_probe: None,
            stream_probe: None,
            is_running: true,
            started_at: Some(started_at),
            finished_at: None,
        }
    }

    pub fn finished(
        run_id: Uuid,
        started_at: u64,
        request_probe: ProbeOutcome,
        stream_probe: ProbeOutcome,
    ) -> Self {
        Self {
            run_id,
            request_probe: Some(request_probe),
            stream_probe: Some(stream_probe),
            is_running: false,
            started_at: Some(started_at),
            finished_at: Some(now_millis()),
        }
    }

    /// True once both probes settled successfully.
    pub fn all_passed(&self) -> bool {
        !self.is_running
            && [&self.request_probe, &self.stream_probe]
                .into_iter()
                .all(|probe| probe.as_ref().is_some_and(ProbeOutcome::succeeded))
    }
}

impl Default for HealthCheckResult {
    fn default() -> Self {
        Self::idle()
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
