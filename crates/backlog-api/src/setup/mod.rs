//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod validation;

use std::sync::Arc;

use anyhow::{Context, Result};
use backlog_core::Config;

use crate::state::AppState;

/// Initialize the entire application: telemetry, database, state and routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.log_format)?;

    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;
    tracing::info!(environment = %config.environment, "Configuration loaded and validated");

    let pool = database::setup_database(&config).await?;
    let state = build_state(config, pool).await?;
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}

/// Build shared state from an already migrated pool, creating the upload root if needed.
pub async fn build_state(config: Config, pool: sqlx::SqlitePool) -> Result<Arc<AppState>> {
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.upload_dir.display()
            )
        })?;
    tracing::info!(upload_dir = %config.upload_dir.display(), "Upload directory ready");

    Ok(Arc::new(AppState::new(config, pool)))
}
