//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use math_drill_core::AnalyzerPolicy;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    /// How many recent questions the generator checks for repetition.
    pub history_lookback: usize,
    pub analyzer: AnalyzerPolicy,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:3000".parse::<SocketAddr>().ok())?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://math_drill.db?mode=rwc".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        // --- Load Trainer Settings ---
        let history_lookback =
            parse_var("HISTORY_LOOKBACK", Some(math_drill_core::DEFAULT_LOOKBACK))?;

        let defaults = AnalyzerPolicy::default();
        let analyzer = AnalyzerPolicy {
            window_days: parse_var("ANALYSIS_WINDOW_DAYS", Some(defaults.window_days))?,
            min_sessions: parse_var("ANALYSIS_MIN_SESSIONS", Some(defaults.min_sessions))?,
            min_op_samples: parse_var("ANALYSIS_MIN_SAMPLES", Some(defaults.min_op_samples))?,
            error_threshold: parse_var("ANALYSIS_ERROR_THRESHOLD", Some(defaults.error_threshold))?,
            ..defaults
        };
        if !(0.0..=1.0).contains(&analyzer.error_threshold) {
            return Err(ConfigError::InvalidValue(
                "ANALYSIS_ERROR_THRESHOLD".to_string(),
                "must be between 0 and 1".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            history_lookback,
            analyzer,
        })
    }
}

/// Reads and parses `name`, falling back to `default` when the variable is unset.
/// A variable with no default is required.
fn parse_var<T>(name: &str, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => default.ok_or_else(|| ConfigError::MissingVar(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_use_defaults() {
        let value: usize = parse_var("MATH_DRILL_TEST_UNSET_VAR", Some(5)).unwrap();
        assert_eq!(value, 5);
        assert!(matches!(
            parse_var::<usize>("MATH_DRILL_TEST_UNSET_VAR", None),
            Err(ConfigError::MissingVar(_))
        ));
    }

    #[test]
    fn malformed_values_are_reported() {
        std::env::set_var("MATH_DRILL_TEST_BAD_NUMBER", "twelve");
        let err = parse_var::<usize>("MATH_DRILL_TEST_BAD_NUMBER", Some(1)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "MATH_DRILL_TEST_BAD_NUMBER"));
    }
}
