//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::CheckerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the request/response base URL.
pub const API_BASE_URL_ENV: &str = "CONNCHECK_API_BASE_URL";
/// Overrides the WebSocket base URL.
pub const WS_BASE_URL_ENV: &str = "CONNCHECK_WS_BASE_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Base URL overrides given on the command line. They win over both the
/// file and the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlOverrides {
    pub api_base_url: Option<String>,
    pub ws_base_url: Option<String>,
}

impl UrlOverrides {
    pub fn apply(&self, config: &mut CheckerConfig) {
        if let Some(url) = &self.api_base_url {
            config.endpoints.api_base_url = Some(url.clone());
        }
        if let Some(url) = &self.ws_base_url {
            config.endpoints.ws_base_url = Some(url.clone());
        }
    }
}

/// Parse a TOML file and apply environment overrides.
///
/// Not validated: command-line overrides still have to be layered on top,
/// see [`finalize`].
pub fn load_config(path: &Path) -> Result<CheckerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: CheckerConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Load the file when it exists, otherwise start from defaults.
pub fn load_or_default(path: &Path) -> Result<CheckerConfig, ConfigError> {
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(path = ?path, "Config file not found, using defaults");
    let mut config = CheckerConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Apply command-line overrides, then validate the fully layered config.
pub fn finalize(mut config: CheckerConfig, overrides: &UrlOverrides) -> Result<CheckerConfig, ConfigError> {
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply base URL overrides from the environment.
///
/// The lookup is injected so tests don't have to mutate process state.
pub fn apply_env_overrides<F>(config: &mut CheckerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(API_BASE_URL_ENV).filter(|v| !v.is_empty()) {
        config.endpoints.api_base_url = Some(url);
    }
    if let Some(url) = lookup(WS_BASE_URL_ENV).filter(|v| !v.is_empty()) {
        config.endpoints.ws_base_url = Some(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}-{}.toml", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CheckerConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            API_BASE_URL_ENV => Some("https://radio.example".into()),
            WS_BASE_URL_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.endpoints.api_base_url.as_deref(), Some("https://radio.example"));
        assert!(config.endpoints.ws_base_url.is_none());
    }

    #[test]
    fn test_load_valid_file() {
        let path = temp_path("conncheck-valid");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[endpoints]\napi_base_url = \"http://127.0.0.1:9000\"").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.endpoints().request_url.starts_with("http://127.0.0.1:9000/"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_finalize_reports_validation_errors() {
        let path = temp_path("conncheck-invalid");
        fs::write(&path, "[probes]\nstream_timeout_ms = 0\n").unwrap();

        let config = load_config(&path).unwrap();
        let err = finalize(config, &UrlOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("probes.stream_timeout_ms"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_cli_override_repairs_bad_file_url() {
        let path = temp_path("conncheck-bad-url");
        fs::write(
            &path,
            "[endpoints]\napi_base_url = \"ftp://radio.example\"\nws_base_url = \"ws://radio.example\"\n",
        )
        .unwrap();

        let loaded = load_config(&path).unwrap();
        assert!(matches!(
            finalize(loaded.clone(), &UrlOverrides::default()),
            Err(ConfigError::Validation(_))
        ));

        let overrides = UrlOverrides {
            api_base_url: Some("http://127.0.0.1:9000".into()),
            ws_base_url: None,
        };
        let config = finalize(loaded, &overrides).unwrap();
        assert_eq!(
            config.endpoints().request_url,
            "http://127.0.0.1:9000/api/stream/cors-test"
        );
        assert_eq!(config.endpoints().stream_url, "ws://radio.example/ws/live");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_parse_error() {
        let path = temp_path("conncheck-garbage");
        fs::write(&path, "environment = [").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_file(path);
    }
}
