//! Size check, type sniffing, path guard and exclusive write for uploaded images

use std::io;
use std::path::{Path, PathBuf};

use backlog_core::config::MAX_UPLOAD_BYTES;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::path_guard::{resolve_target, GuardVerdict};
use crate::sniff::{sniff, SniffedType};

/// Why an upload was refused. The string forms are a stable, closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    TooBig,
    BadType,
    SymlinkParent,
    MissingBase,
    PathTraversal,
    Collision,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::TooBig => "too_big",
            RejectReason::BadType => "bad_type",
            RejectReason::SymlinkParent => "symlink_parent",
            RejectReason::MissingBase => "missing_base",
            RejectReason::PathTraversal => "path_traversal",
            RejectReason::Collision => "collision",
        }
    }

    /// Rejections caused by the server's own directory layout rather than the payload
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            RejectReason::SymlinkParent | RejectReason::MissingBase | RejectReason::PathTraversal
        )
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single persist call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted {
        stored_path: PathBuf,
        media_type: SniffedType,
    },
    Rejected(RejectReason),
}

impl UploadOutcome {
    /// `(true, stored path)` or `(false, reason code)`
    pub fn as_pair(&self) -> (bool, String) {
        match self {
            UploadOutcome::Accepted { stored_path, .. } => {
                (true, stored_path.to_string_lossy().into_owned())
            }
            UploadOutcome::Rejected(reason) => (false, reason.as_str().to_string()),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, UploadOutcome::Accepted { .. })
    }
}

/// Writes uploads below a fixed base directory.
///
/// Constructed once at bootstrap and shared; holds no mutable state.
#[derive(Debug, Clone)]
pub struct SecureUploader {
    base_dir: PathBuf,
    max_bytes: usize,
}

impl SecureUploader {
    pub fn new(base_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_bytes,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Persist `data` directly under the base directory.
    pub async fn persist(&self, filename_hint: &str, data: &[u8]) -> StorageResult<UploadOutcome> {
        self.persist_in(None, filename_hint, data).await
    }

    /// Persist `data` under `{base}/{partition}/`, creating the partition directory
    /// on first use. `filename_hint` is only logged.
    #[tracing::instrument(skip(self, data), fields(size_bytes = data.len()))]
    pub async fn persist_in(
        &self,
        partition: Option<&str>,
        filename_hint: &str,
        data: &[u8],
    ) -> StorageResult<UploadOutcome> {
        if data.len() > self.max_bytes {
            return Ok(self.reject(RejectReason::TooBig, filename_hint));
        }

        let sniffed = sniff(data);
        let extension = match sniffed.extension() {
            Some(ext) => ext,
            None => return Ok(self.reject(RejectReason::BadType, filename_hint)),
        };

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        self.store(partition, &file_name, filename_hint, sniffed, data)
            .await
    }

    /// Guard and exclusively write `data` as `{partition}/{file_name}`.
    async fn store(
        &self,
        partition: Option<&str>,
        file_name: &str,
        filename_hint: &str,
        sniffed: SniffedType,
        data: &[u8],
    ) -> StorageResult<UploadOutcome> {
        let relative = match partition {
            Some(dir) => Path::new(dir).join(file_name),
            None => PathBuf::from(file_name),
        };

        let target = match self.guard(&relative).await? {
            GuardVerdict::Inside(path) => path,
            GuardVerdict::Rejected(reason) => return Ok(self.reject(reason, filename_hint)),
        };

        let target = if partition.is_some() {
            match self.ensure_partition(&target, &relative).await? {
                GuardVerdict::Inside(path) => path,
                GuardVerdict::Rejected(reason) => return Ok(self.reject(reason, filename_hint)),
            }
        } else {
            target
        };

        match write_exclusive(&target, data).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Ok(self.reject(RejectReason::Collision, filename_hint));
            }
            Err(e) => {
                return Err(StorageError::UploadFailed(format!(
                    "Failed to write upload: {}",
                    e
                )));
            }
        }

        tracing::info!(
            filename_hint = %filename_hint,
            media_type = sniffed.media_type().unwrap_or_default(),
            stored_path = %target.display(),
            "Upload stored"
        );

        Ok(UploadOutcome::Accepted {
            stored_path: target,
            media_type: sniffed,
        })
    }

    async fn guard(&self, relative: &Path) -> StorageResult<GuardVerdict> {
        let base = self.base_dir.clone();
        let relative = relative.to_path_buf();
        tokio::task::spawn_blocking(move || resolve_target(&base, &relative))
            .await
            .map_err(|e| StorageError::TaskFailed(e.to_string()))?
    }

    /// Create the missing parent of `target` without following symlinks, then re-check.
    async fn ensure_partition(&self, target: &Path, relative: &Path) -> StorageResult<GuardVerdict> {
        if let Some(parent) = target.parent() {
            // create_dir fails with AlreadyExists on any existing entry, symlinks included
            match tokio::fs::create_dir(parent).await {
                Ok(()) => tracing::debug!(dir = %parent.display(), "Created upload partition"),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.guard(relative).await
    }

    fn reject(&self, reason: RejectReason, filename_hint: &str) -> UploadOutcome {
        if reason.is_misconfiguration() {
            tracing::error!(
                reason = reason.as_str(),
                base_dir = %self.base_dir.display(),
                "Upload directory failed safety checks"
            );
        } else {
            tracing::debug!(
                reason = reason.as_str(),
                filename_hint = %filename_hint,
                "Upload rejected"
            );
        }
        UploadOutcome::Rejected(reason)
    }
}

/// Persist under `base_dir` with the default size cap.
pub async fn secure_persist(
    base_dir: &Path,
    filename_hint: &str,
    data: &[u8],
) -> StorageResult<UploadOutcome> {
    SecureUploader::new(base_dir, MAX_UPLOAD_BYTES)
        .persist(filename_hint, data)
        .await
}

async fn write_exclusive(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written = async {
        file.write_all(data).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        // only the file created above is removed
        let _ = tokio::fs::remove_file(path).await;
        return Err(e);
    }
    Ok(())
}
