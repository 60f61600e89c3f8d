//! Application state, built once at bootstrap and shared as `Arc<AppState>`.

use backlog_core::Config;
use backlog_db::ItemRepository;
use backlog_storage::SecureUploader;
use sqlx::SqlitePool;

/// Database pool and repositories
#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub items: ItemRepository,
}

impl DbState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            items: ItemRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Shared-secret settings for mutating endpoints
#[derive(Clone)]
pub struct SecurityConfig {
    pub api_token: Option<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DbState,
    pub uploads: SecureUploader,
    pub security: SecurityConfig,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let uploads = SecureUploader::new(config.upload_dir.clone(), config.max_upload_bytes);
        let security = SecurityConfig {
            api_token: config.api_token.clone(),
        };
        Self {
            db: DbState::new(pool),
            uploads,
            security,
            config,
        }
    }
}
