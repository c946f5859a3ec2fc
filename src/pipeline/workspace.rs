//! Workspace lifecycle: wipe an output directory and recreate it empty.

use crate::error::{ResetStage, WorkspaceError};
use std::io;
use std::path::Path;
use tracing::debug;

/// Recursively remove whatever is at `path` and create a fresh, empty
/// directory there.
///
/// A missing entry is not an error, and a regular file or symlink at `path`
/// is removed like a directory would be. Missing parents are created.
/// Calling this twice in a row leaves an empty directory both times.
///
/// Everything previously stored at `path` is lost.
pub async fn reset_workspace(path: &Path) -> Result<(), WorkspaceError> {
    remove_entry(path).await.map_err(|e| WorkspaceError {
        path: path.to_path_buf(),
        stage: ResetStage::Remove,
        detail: e.to_string(),
    })?;

    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| WorkspaceError {
            path: path.to_path_buf(),
            stage: ResetStage::Create,
            detail: e.to_string(),
        })?;

    debug!("Reset workspace: {}", path.display());
    Ok(())
}

async fn remove_entry(path: &Path) -> io::Result<()> {
    // symlink_metadata so a link to a directory is unlinked, not followed.
    let meta = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let result = if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        // Lost a race with another remover: the goal state is reached.
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
