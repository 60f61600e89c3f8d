use thiserror::Error;

/// Unexpected storage failures. Policy rejections are reported through
/// [`crate::UploadOutcome`] instead.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Blocking task failed: {0}")]
    TaskFailed(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
