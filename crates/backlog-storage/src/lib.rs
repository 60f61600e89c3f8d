//! Backlog Storage Library
//!
//! Secure persistence of uploaded images on the local filesystem.
//!
//! # Upload layout
//!
//! - **Bare uploads**: `{upload_dir}/{uuid}.{ext}`
//! - **Item images**: `{upload_dir}/{item_id}/{uuid}.{ext}`
//!
//! File names are always generated; the client-supplied name is only logged. Every write is
//! an exclusive create, so an existing file is never overwritten.

pub mod error;
pub mod path_guard;
pub mod persist;
pub mod sniff;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use path_guard::{resolve_target, GuardVerdict};
pub use persist::{secure_persist, RejectReason, SecureUploader, UploadOutcome};
pub use sniff::{sniff, SniffedType};
