//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that resolved endpoints use the right schemes
//! - Validate value ranges (timeouts > 0, metrics address parseable)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CheckerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::CheckerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field}: scheme '{scheme}' not allowed, expected one of {expected:?}")]
    WrongScheme {
        field: &'static str,
        scheme: String,
        expected: &'static [&'static str],
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("observability.metrics_address: invalid socket address '{0}'")]
    MetricsAddress(String),
}

pub fn validate_config(config: &CheckerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let endpoints = config.endpoints();

    check_url(&mut errors, "endpoints.request_url", &endpoints.request_url, &["http", "https"]);
    check_url(&mut errors, "endpoints.stream_url", &endpoints.stream_url, &["ws", "wss"]);

    if config.probes.stream_timeout_ms == 0 {
        errors.push(ValidationError::Zero("probes.stream_timeout_ms"));
    }
    if config.probes.request_timeout_ms == Some(0) {
        errors.push(ValidationError::Zero("probes.request_timeout_ms"));
    }
    if config.watch.interval_secs == 0 {
        errors.push(ValidationError::Zero("watch.interval_secs"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
    expected: &'static [&'static str],
) {
    match Url::parse(value) {
        Ok(url) if expected.contains(&url.scheme()) => {}
        Ok(url) => errors.push(ValidationError::WrongScheme {
            field,
            scheme: url.scheme().to_string(),
            expected,
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
