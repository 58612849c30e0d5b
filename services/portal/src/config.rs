//! services/portal/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Backend origin, e.g. `http://localhost:8000`. Never ends with `/`.
    pub origin: String,
    pub session_dir: PathBuf,
    pub timeout: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let origin = lookup("PORTAL_ORIGIN")
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("PORTAL_ORIGIN".to_string()))?;
        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PORTAL_ORIGIN".to_string(),
                format!("'{}' must start with http:// or https://", origin),
            ));
        }

        let session_dir = lookup("PORTAL_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.portal-session"));

        let timeout_str = lookup("PORTAL_TIMEOUT_SECS").unwrap_or_else(|| "15".to_string());
        let timeout_secs = timeout_str.parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue("PORTAL_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            origin,
            session_dir,
            timeout: Duration::from_secs(timeout_secs),
            log_level,
        })
    }

    /// Every endpoint lives under `<origin>/api`.
    pub fn api_base(&self) -> String {
        format!("{}/api", self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_origin_is_set() {
        let config = Config::from_lookup(lookup(&[("PORTAL_ORIGIN", "http://localhost:8000/")]))
            .unwrap();

        assert_eq!(config.origin, "http://localhost:8000");
        assert_eq!(config.api_base(), "http://localhost:8000/api");
        assert_eq!(config.session_dir, PathBuf::from("./.portal-session"));
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn missing_origin_is_reported() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("PORTAL_ORIGIN".to_string()));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[
            ("PORTAL_ORIGIN", "https://portal.example.gov"),
            ("PORTAL_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue(ref var, _) if var == "PORTAL_TIMEOUT_SECS"
        ));

        let err = Config::from_lookup(lookup(&[
            ("PORTAL_ORIGIN", "https://portal.example.gov"),
            ("RUST_LOG", "chatty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "RUST_LOG"));

        let err =
            Config::from_lookup(lookup(&[("PORTAL_ORIGIN", "portal.example.gov")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "PORTAL_ORIGIN"));
    }
}
