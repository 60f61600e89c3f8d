//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use backlog_core::Config;

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.request_timeout_secs == 0 {
        return Err(anyhow::anyhow!("Request timeout cannot be 0"));
    }

    if config.upload_dir.as_os_str().is_empty() {
        return Err(anyhow::anyhow!("UPLOAD_DIR cannot be empty"));
    }

    if config.is_production() && config.database_url.contains(":memory:") {
        tracing::warn!("In-memory database configured in production - data is lost on restart");
    }

    Ok(())
}
