//! Backlog Core Library
//!
//! This crate provides the domain models, error types, configuration, and request
//! validation shared by the database, storage, and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, LogFormat};
pub use error::{title_from_code, AppError, ErrorMetadata, LogLevel};
pub use models::{Patch, ALLOWED_STATUSES};
pub use validation::FieldOrder;
