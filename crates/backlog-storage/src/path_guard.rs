//! Destination path resolution with symlink and traversal checks
//!
//! The guard only inspects metadata; it never creates or modifies anything.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::StorageResult;
use crate::persist::RejectReason;

/// Result of resolving a destination inside the upload root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Absolute target strictly inside the canonical base
    Inside(PathBuf),
    Rejected(RejectReason),
}

/// Resolve `relative` against `base_dir` into a canonical absolute target.
///
/// Checks, in order: `base_dir` is not a symlink and exists as a directory; `relative`
/// consists of plain names only; no existing directory between the base and the target
/// is a symlink; the non-strict canonical target is contained in the canonical base.
pub fn resolve_target(base_dir: &Path, relative: &Path) -> StorageResult<GuardVerdict> {
    // `link/` and `link/.` make lstat follow the link; drop trailing separators and dots
    let base_dir: PathBuf = base_dir.components().collect();

    match std::fs::symlink_metadata(&base_dir) {
        Ok(meta) if meta.file_type().is_symlink() => {
            return Ok(GuardVerdict::Rejected(RejectReason::SymlinkParent));
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(GuardVerdict::Rejected(RejectReason::MissingBase));
        }
        Err(e) => return Err(e.into()),
    }

    let canonical_base = match std::fs::canonicalize(&base_dir) {
        Ok(path) => path,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(GuardVerdict::Rejected(RejectReason::MissingBase));
        }
        Err(e) => return Err(e.into()),
    };
    if !canonical_base.is_dir() {
        return Ok(GuardVerdict::Rejected(RejectReason::MissingBase));
    }

    let has_components = relative.components().next().is_some();
    let plain_names = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !has_components || !plain_names {
        return Ok(GuardVerdict::Rejected(RejectReason::PathTraversal));
    }

    let target = canonical_base.join(relative);

    if has_symlinked_ancestor(&canonical_base, &target)? {
        return Ok(GuardVerdict::Rejected(RejectReason::SymlinkParent));
    }

    let resolved = canonicalize_non_strict(&target)?;
    if resolved == canonical_base || !resolved.starts_with(&canonical_base) {
        return Ok(GuardVerdict::Rejected(RejectReason::PathTraversal));
    }

    Ok(GuardVerdict::Inside(resolved))
}

/// Whether any existing directory strictly between `base` and `target` is a symlink.
fn has_symlinked_ancestor(base: &Path, target: &Path) -> io::Result<bool> {
    let mut current = target.parent();
    while let Some(dir) = current {
        if dir == base || !dir.starts_with(base) {
            break;
        }
        match std::fs::symlink_metadata(dir) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        current = dir.parent();
    }
    Ok(false)
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the rest.
fn canonicalize_non_strict(path: &Path) -> io::Result<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut missing = Vec::new();

    loop {
        match std::fs::canonicalize(&existing) {
            Ok(canonical) => {
                let mut resolved = canonical;
                for name in missing.iter().rev() {
                    resolved.push(name);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let name = existing.file_name().map(|n| n.to_os_string());
                match (name, existing.parent()) {
                    (Some(name), Some(parent)) => {
                        missing.push(name);
                        existing = parent.to_path_buf();
                    }
                    _ => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
}
