//! Database repositories for data access layer
//!
//! Each repository owns a clone of the pool and maps rows onto `backlog-core` models.

pub mod item;

use sqlx::migrate::Migrator;

pub use item::ItemRepository;

/// Embedded schema migrations (workspace `migrations/`)
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
