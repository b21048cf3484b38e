//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CARTWHEEL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `CARTWHEEL_HOST` - Bind address (default: 0.0.0.0)
//! - `CARTWHEEL_PORT` - Listen port (falls back to `PORT`, default: 8080)
//! - `CARTWHEEL_CORS_ORIGINS` - Comma-separated allowed origins (default: <http://localhost:3000>)
//! - `CARTWHEEL_SEED_SAMPLE_DATA` - Seed the admin user and sample catalog on startup (default: false)
//! - `CARTWHEEL_LOG_JSON` - Emit logs as JSON lines (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "8080";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origins allowed to make cross-origin requests
    pub cors_origins: Vec<String>,
    /// Seed sample data before serving
    pub seed_sample_data: bool,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let database_url = env.database_url("CARTWHEEL_DATABASE_URL")?;
        let host = env.parse::<IpAddr>("CARTWHEEL_HOST", DEFAULT_HOST)?;
        let port = match env.optional("CARTWHEEL_PORT") {
            Some(_) => env.parse::<u16>("CARTWHEEL_PORT", DEFAULT_PORT)?,
            None => env.parse::<u16>("PORT", DEFAULT_PORT)?,
        };
        let cors_origins = parse_origins(&env.or_default("CARTWHEEL_CORS_ORIGINS", DEFAULT_CORS_ORIGINS));
        let seed_sample_data = env.flag("CARTWHEEL_SEED_SAMPLE_DATA")?;
        let log_json = env.flag("CARTWHEEL_LOG_JSON")?;

        Ok(Self {
            database_url,
            host,
            port,
            cors_origins,
            seed_sample_data,
            log_json,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parse("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Typed access to a variable source. Empty values count as unset.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse a boolean flag, defaulting to false.
    fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        self.optional(key).map_or(Ok(false), |value| {
            parse_bool(&value).ok_or_else(|| {
                ConfigError::InvalidEnvVar(key.to_string(), format!("expected a boolean, got '{value}'"))
            })
        })
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("CARTWHEEL_DATABASE_URL", "postgres://localhost/shop")]).unwrap();

        assert_eq!(config.database_url.expose_secret(), "postgres://localhost/shop");
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert!(!config.seed_sample_data);
        assert!(!config.log_json);
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
        assert!(config.sentry_traces_sample_rate.abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "CARTWHEEL_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");

        let config = load(&[
            ("CARTWHEEL_DATABASE_URL", "postgres://primary/db"),
            ("DATABASE_URL", "postgres://fallback/db"),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://primary/db");
    }

    #[test]
    fn test_port_fallback() {
        let base = ("CARTWHEEL_DATABASE_URL", "postgres://localhost/shop");

        assert_eq!(load(&[base, ("PORT", "9000")]).unwrap().port, 9000);
        assert_eq!(
            load(&[base, ("PORT", "9000"), ("CARTWHEEL_PORT", "7000")])
                .unwrap()
                .port,
            7000
        );
    }

    #[test]
    fn test_invalid_values() {
        let base = ("CARTWHEEL_DATABASE_URL", "postgres://localhost/shop");

        for (key, value) in [
            ("CARTWHEEL_PORT", "not-a-port"),
            ("CARTWHEEL_HOST", "localhost:80"),
            ("CARTWHEEL_SEED_SAMPLE_DATA", "maybe"),
            ("SENTRY_SAMPLE_RATE", "lots"),
        ] {
            let err = load(&[base, (key, value)]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidEnvVar(k, _) if k == key),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn test_flags_and_origins() {
        let config = load(&[
            ("CARTWHEEL_DATABASE_URL", "postgres://localhost/shop"),
            ("CARTWHEEL_SEED_SAMPLE_DATA", "TRUE"),
            ("CARTWHEEL_LOG_JSON", "1"),
            ("CARTWHEEL_CORS_ORIGINS", "https://a.example, ,https://b.example"),
        ])
        .unwrap();

        assert!(config.seed_sample_data);
        assert!(config.log_json);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("CARTWHEEL_DATABASE_URL", "postgres://user:hunter2@db/shop")]).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
