//! Configuration module
//!
//! Runtime configuration is read once at process bootstrap (`Config::from_env`) and
//! passed down explicitly. Nothing in the workspace reads the environment lazily.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

// Common constants
const SERVER_HOST: &str = "0.0.0.0";
const SERVER_PORT: u16 = 8000;
const DATABASE_URL: &str = "sqlite://app.db";
const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const UPLOAD_DIR: &str = "./uploads";
/// Largest accepted upload payload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5_000_000;
const HTTP_CONCURRENCY_LIMIT: usize = 1024;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Console log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'compact' or 'json'",
                other
            )),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Shared secret expected in `X-API-Key` for mutating requests.
    pub api_token: Option<String>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub http_concurrency_limit: usize,
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            environment: "development".to_string(),
            server_host: SERVER_HOST.to_string(),
            server_port: SERVER_PORT,
            database_url: DATABASE_URL.to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            api_token: None,
            upload_dir: PathBuf::from(UPLOAD_DIR),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            log_format: LogFormat::Compact,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read configuration from the environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or(defaults.environment);

        let api_token = env::var("APP_API_TOKEN").ok();

        Ok(Config {
            environment,
            server_host: env::var("HOST").unwrap_or(defaults.server_host),
            server_port: parse_env("PORT", defaults.server_port)?,
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_timeout_seconds: parse_env("DB_TIMEOUT_SECONDS", defaults.db_timeout_seconds)?,
            api_token,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            http_concurrency_limit: parse_env(
                "HTTP_CONCURRENCY_LIMIT",
                defaults.http_concurrency_limit,
            )?,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            log_format: parse_env("LOG_FORMAT", defaults.log_format)?,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Address the HTTP listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Fail fast on settings that would make the service unusable or unsafe.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("Database max connections cannot be 0"));
        }

        if self.db_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Database timeout cannot be 0"));
        }

        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("Max upload size cannot be 0"));
        }

        if self.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP concurrency limit cannot be 0"));
        }

        match self.api_token.as_deref() {
            Some("") => {
                return Err(anyhow::anyhow!(
                    "APP_API_TOKEN is set but empty - unset it or provide a real token"
                ));
            }
            None if self.is_production() => {
                return Err(anyhow::anyhow!(
                    "APP_API_TOKEN must be set in production"
                ));
            }
            None => {
                tracing::warn!(
                    "APP_API_TOKEN not set - mutating endpoints will answer auth_not_configured"
                );
            }
            Some(_) => {}
        }

        Ok(())
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("{} has an invalid value", key)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_upload_bytes, 5_000_000);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_production_requires_token() {
        let config = Config {
            environment: "Production".to_string(),
            ..Config::default()
        };
        assert!(config.is_production());
        assert!(config.validate().is_err());

        let config = Config {
            api_token: Some("s3cret".to_string()),
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let config = Config {
            api_token: Some(String::new()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let config = Config {
            max_upload_bytes: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Compact ".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
