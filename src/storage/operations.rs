//! Storage operations
//!
//! Upload, remove and download preparation. Every function takes paths that
//! already went through [`Root`]; none of them builds a filesystem path from
//! raw client input.

use log::{error, info, warn};
use std::fs;
use std::io;
use std::path::Path;

use crate::error::StorageError;
use crate::storage::path::{ResolvedPath, Root};
use crate::storage::results::DownloadTarget;

/// Writes `content` as `filename` inside `dest_dir`.
///
/// `filename` is untrusted and must be a single plain segment. An existing
/// file with the same name is overwritten.
pub fn upload_file(
    root: &Root,
    dest_dir: &ResolvedPath,
    filename: &str,
    content: &[u8],
) -> Result<ResolvedPath, StorageError> {
    let virtual_dir = dest_dir.relative().to_string();

    let metadata =
        fs::metadata(dest_dir.path()).map_err(|e| StorageError::from_io(e, &virtual_dir))?;
    if !metadata.is_dir() {
        return Err(StorageError::NotADirectory(virtual_dir));
    }

    let target = root.resolve_child(dest_dir, filename)?;

    if let Err(e) = fs::write(target.path(), content) {
        error!(
            "Failed to write {} (virtual: {}, real: {}): {}",
            filename,
            target.relative(),
            target.path().display(),
            e
        );
        return Err(StorageError::Io(e));
    }

    info!(
        "Stored file {} (virtual: {}, real: {}) - {} bytes",
        filename,
        target.relative(),
        target.path().display(),
        content.len()
    );

    Ok(target)
}

/// Deletes a file, or a directory with everything under it.
///
/// Missing targets are a no-op so concurrent or repeated removes all
/// succeed. A symlink is unlinked, never followed. The root itself, and the
/// filesystem root, are refused before anything is touched.
pub fn remove_path(root: &Root, target: &ResolvedPath) -> Result<(), StorageError> {
    if root.is_root(target) || target.relative().is_root() || is_filesystem_root(target.path()) {
        warn!(
            "Refused to delete root (requested: /{}, real: {})",
            target.relative(),
            target.path().display()
        );
        return Err(StorageError::RefusedRootDeletion);
    }

    let entry = target.entry_path();
    let metadata = match fs::symlink_metadata(entry) {
        Ok(m) => m,
        Err(e) if is_missing(&e) => {
            info!("Nothing to delete at /{}", target.relative());
            return Ok(());
        }
        Err(e) => return Err(StorageError::Io(e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(entry)
    } else {
        fs::remove_file(entry)
    };

    match result {
        Ok(()) => {
            info!(
                "Deleted {} /{} (real: {})",
                if metadata.is_dir() { "directory" } else { "file" },
                target.relative(),
                entry.display()
            );
            Ok(())
        }
        // lost a race with another remove
        Err(e) if is_missing(&e) => Ok(()),
        Err(e) => {
            error!(
                "Failed to delete /{} (real: {}): {}",
                target.relative(),
                entry.display(),
                e
            );
            Err(StorageError::Io(e))
        }
    }
}

/// Checks that `target` is an existing regular file and returns what is
/// needed to stream it.
pub fn prepare_download(target: &ResolvedPath) -> Result<DownloadTarget, StorageError> {
    let virtual_path = target.relative().to_string();
    let metadata =
        fs::metadata(target.path()).map_err(|e| StorageError::from_io(e, &virtual_path))?;

    if !metadata.is_file() {
        return Err(StorageError::NotFound(virtual_path));
    }

    info!(
        "Prepared download of /{} (real: {})",
        virtual_path,
        target.path().display()
    );

    Ok(DownloadTarget {
        file_path: target.path().to_path_buf(),
        size: metadata.len(),
        modified_at: metadata.modified().ok(),
    })
}

// ENOTDIR means some ancestor is a regular file, so the entry cannot exist.
fn is_missing(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn is_filesystem_root(path: &Path) -> bool {
    path.parent().is_none()
}
