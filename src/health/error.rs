//! Probe failure taxonomy.
//!
//! Every variant renders to the human-readable `detail` carried by a failed
//! [`ProbeOutcome`](super::ProbeOutcome). Nothing here is ever returned from
//! the runner itself.

use thiserror::Error;

/// Reason a single probe failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Connection-level failure (DNS, refused, reset, TLS, invalid address).
    #[error("{0}")]
    Transport(String),

    /// The response did not allow the configured origin.
    #[error("CORS rejected: {0}")]
    CorsRejected(String),

    /// Response arrived with a non-success status.
    #[error("HTTP {code}: {reason}")]
    Status { code: u16, reason: String },

    /// Response body could not be parsed as JSON.
    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    /// Connection closed with a non-normal code before it opened.
    #[error("WebSocket closed unexpectedly (code: {0})")]
    AbnormalClose(u16),

    /// No terminal handshake event inside the window.
    #[error("WebSocket connection timeout")]
    StreamTimeout,

    /// Request exceeded the configured deadline.
    #[error("Request timeout after {0} ms")]
    RequestTimeout(u64),
}

impl ProbeError {
    /// Build a transport error, substituting `fallback` for empty text.
    pub fn transport(text: impl Into<String>, fallback: &str) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            ProbeError::Transport(fallback.to_string())
        } else {
            ProbeError::Transport(text)
        }
    }

    /// Coarse class used for metrics and log fields.
    pub fn class(&self) -> &'static str {
        match self {
            ProbeError::Transport(_) | ProbeError::CorsRejected(_) => "transport",
            ProbeError::Status { .. } | ProbeError::MalformedBody(_) => "protocol",
            ProbeError::AbnormalClose(_) => "abnormal_termination",
            ProbeError::StreamTimeout | ProbeError::RequestTimeout(_) => "timeout",
        }
    }
}
