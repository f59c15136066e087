//! Request/response probe.
//!
//! # Responsibilities
//! - Issue one JSON GET against the diagnostic endpoint
//! - Emulate the browser's cross-origin check when an origin is configured
//! - Parse the body and attach it to the outcome
//!
//! # Design Decisions
//! - No deadline unless `request_timeout_ms` is configured
//! - CORS is checked before the status, as a browser hides the status of a
//!   rejected cross-origin response

use reqwest::header::{HeaderMap, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, ORIGIN};
use reqwest::Client;
use serde_json::Value;
use std::error::Error as StdError;
use std::time::{Duration, Instant};

use crate::config::ProbeConfig;
use crate::health::error::ProbeError;
use crate::health::outcome::{ProbeKind, ProbeOutcome};
use crate::observability::metrics;

const GENERIC_REQUEST_ERROR: &str = "Failed to fetch";

#[derive(Debug, Clone)]
pub struct RequestProbe {
    client: Client,
    origin: Option<String>,
    timeout_ms: Option<u64>,
}

impl RequestProbe {
    /// Build the probe and its HTTP client from probe settings.
    pub fn from_config(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(concat!(
            "connectivity-check/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        Ok(Self {
            client: builder.build()?,
            origin: config.origin.clone(),
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// Probe `url`. Never fails; every problem lands in the outcome.
    pub async fn check(&self, url: &str) -> ProbeOutcome {
        let started = Instant::now();
        let result = self.fetch(url).await;
        let elapsed = started.elapsed();

        match result {
            Ok(payload) => {
                tracing::debug!(url = %url, elapsed_ms = elapsed.as_millis() as u64, "Request probe succeeded");
                ProbeOutcome::success(ProbeKind::Request, Some(payload), elapsed)
            }
            Err(err) => {
                tracing::warn!(url = %url, error = %err, class = err.class(), "Request probe failed");
                metrics::record_failure_class(ProbeKind::Request.label(), err.class());
                ProbeOutcome::failure(ProbeKind::Request, &err, elapsed)
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<Value, ProbeError> {
        let mut request = self.client.get(url).header(CONTENT_TYPE, "application/json");
        if let Some(origin) = &self.origin {
            request = request.header(ORIGIN, origin);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        if let Some(origin) = &self.origin {
            check_cors(response.headers(), origin)?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&body).map_err(|e| ProbeError::MalformedBody(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> ProbeError {
        match self.timeout_ms {
            Some(ms) if err.is_timeout() => ProbeError::RequestTimeout(ms),
            _ => ProbeError::transport(error_chain(&err), GENERIC_REQUEST_ERROR),
        }
    }
}

/// Verify the response allows `origin`, as a browser would.
fn check_cors(headers: &HeaderMap, origin: &str) -> Result<(), ProbeError> {
    match headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).map(|v| v.to_str()) {
        Some(Ok(allowed)) if allowed == "*" || allowed == origin => Ok(()),
        Some(Ok(allowed)) => Err(ProbeError::CorsRejected(format!(
            "origin '{}' not allowed (server allows '{}')",
            origin, allowed
        ))),
        Some(Err(_)) => Err(ProbeError::CorsRejected(
            "unreadable Access-Control-Allow-Origin header".to_string(),
        )),
        None => Err(ProbeError::CorsRejected(
            "no Access-Control-Allow-Origin header present".to_string(),
        )),
    }
}

/// Render an error with its sources, e.g. "error sending request: connection refused".
fn error_chain(err: &dyn StdError) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
