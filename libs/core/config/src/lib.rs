//! Environment-driven configuration shared by every binary and domain crate.
//!
//! Settings are read from process environment variables only. Each config
//! struct implements [`FromEnv`] and falls back to documented defaults.

pub mod server;
pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

pub use server::ServerConfig;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Invalid value for '{key}': {details}")]
    InvalidValue { key: String, details: String },
}

/// Application environment, selected by `APP_ENV`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Read a variable, falling back to `default` when unset
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a variable or fail with [`ConfigError::MissingEnvVar`]
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Read a variable, treating unset and blank values as absent
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable into `T`, using `default` when it is unset or blank
pub fn env_parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse a boolean flag; accepts `true/false`, `1/0`, `yes/no`, `on/off`
pub fn env_flag(key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = env_optional(key) else {
        return Ok(default);
    };

    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError {
            key: key.to_string(),
            details: format!("'{}' is not a boolean", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert!(Environment::from_env().is_production());
        });
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("CFG_TEST_MODEL", Some("custom"), || {
            assert_eq!(env_or_default("CFG_TEST_MODEL", "default"), "custom");
        });
        temp_env::with_var_unset("CFG_TEST_MODEL", || {
            assert_eq!(env_or_default("CFG_TEST_MODEL", "default"), "default");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("CFG_TEST_REQUIRED", || {
            let err = env_required("CFG_TEST_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("CFG_TEST_REQUIRED"));
        });
    }

    #[test]
    fn test_env_optional_treats_blank_as_unset() {
        temp_env::with_var("CFG_TEST_KEY", Some("   "), || {
            assert_eq!(env_optional("CFG_TEST_KEY"), None);
        });
        temp_env::with_var("CFG_TEST_KEY", Some(" sk-1 "), || {
            assert_eq!(env_optional("CFG_TEST_KEY").as_deref(), Some("sk-1"));
        });
    }

    #[test]
    fn test_env_parse_or() {
        temp_env::with_var_unset("CFG_TEST_FLOOR", || {
            assert_eq!(env_parse_or("CFG_TEST_FLOOR", 0.3f32).unwrap(), 0.3);
        });
        temp_env::with_var("CFG_TEST_FLOOR", Some("0.5"), || {
            assert_eq!(env_parse_or("CFG_TEST_FLOOR", 0.3f32).unwrap(), 0.5);
        });
        temp_env::with_var("CFG_TEST_FLOOR", Some("high"), || {
            let err = env_parse_or("CFG_TEST_FLOOR", 0.3f32).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "CFG_TEST_FLOOR"));
        });
    }

    #[test]
    fn test_env_flag() {
        temp_env::with_var_unset("CFG_TEST_FLAG", || {
            assert!(env_flag("CFG_TEST_FLAG", true).unwrap());
        });
        temp_env::with_var("CFG_TEST_FLAG", Some("off"), || {
            assert!(!env_flag("CFG_TEST_FLAG", true).unwrap());
        });
        temp_env::with_var("CFG_TEST_FLAG", Some("maybe"), || {
            assert!(env_flag("CFG_TEST_FLAG", true).is_err());
        });
    }
}
