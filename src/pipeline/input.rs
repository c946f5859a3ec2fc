//! Input resolution: classify a user-supplied path and select eligible documents.
//!
//! A path is either a single document, which must carry an eligible
//! extension, or a directory whose immediate regular files are filtered by
//! extension. Subdirectories are never descended into.

use crate::error::DispatchError;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions (without the leading dot) a document may carry. Matching is
/// exact and case-sensitive.
pub const ELIGIBLE_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// What kind of filesystem entry the input turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputKind {
    SingleDocument,
    DocumentDirectory,
}

/// The validated document set for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedInput {
    /// The input was an eligible file; the path is returned unchanged.
    Single(PathBuf),
    /// The input was a directory; `entries` are the eligible entry names in
    /// listing order.
    Directory { root: PathBuf, entries: Vec<OsString> },
}

impl ResolvedInput {
    pub fn kind(&self) -> InputKind {
        match self {
            ResolvedInput::Single(_) => InputKind::SingleDocument,
            ResolvedInput::Directory { .. } => InputKind::DocumentDirectory,
        }
    }

    /// Number of documents that will be dispatched.
    pub fn len(&self) -> usize {
        match self {
            ResolvedInput::Single(_) => 1,
            ResolvedInput::Directory { entries, .. } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full document paths: the single path as given, or each entry name
    /// joined onto the directory path.
    pub fn document_paths(&self) -> Vec<PathBuf> {
        match self {
            ResolvedInput::Single(path) => vec![path.clone()],
            ResolvedInput::Directory { root, entries } => {
                entries.iter().map(|name| root.join(name)).collect()
            }
        }
    }
}

/// Check whether `path` carries an eligible extension.
///
/// Dotfiles such as `.md` have no extension and are never eligible.
pub fn is_eligible(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ELIGIBLE_EXTENSIONS.contains(&ext))
}

/// The extension of `path` with its leading dot, or an empty string.
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Resolve `input` into the set of documents to render.
///
/// # Errors
/// - [`DispatchError::NotFound`] if nothing exists at `input`
/// - [`DispatchError::UnsupportedExtension`] if `input` is a file with an
///   ineligible extension
/// - [`DispatchError::PermissionDenied`] / [`DispatchError::Io`] if the
///   entry or listing cannot be read
pub async fn resolve_input(input: &Path) -> Result<ResolvedInput, DispatchError> {
    let meta = tokio::fs::metadata(input)
        .await
        .map_err(|e| DispatchError::from_io(input, e))?;

    if meta.is_dir() {
        let entries = eligible_entries(input).await?;
        debug!(
            "Resolved directory {} to {} eligible documents",
            input.display(),
            entries.len()
        );
        return Ok(ResolvedInput::Directory {
            root: input.to_path_buf(),
            entries,
        });
    }

    if !is_eligible(input) {
        return Err(DispatchError::UnsupportedExtension {
            path: input.to_path_buf(),
            extension: dotted_extension(input),
        });
    }

    debug!("Resolved single document: {}", input.display());
    Ok(ResolvedInput::Single(input.to_path_buf()))
}

/// List the immediate regular files of `dir` with an eligible extension,
/// in the order the directory listing yields them.
async fn eligible_entries(dir: &Path) -> Result<Vec<OsString>, DispatchError> {
    let mut listing = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DispatchError::from_io(dir, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = listing
        .next_entry()
        .await
        .map_err(|e| DispatchError::from_io(dir, e))?
    {
        let name = entry.file_name();
        if !is_eligible(Path::new(&name)) {
            continue;
        }

        // Follows symlinks: a link to an eligible file counts as a file.
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => entries.push(name),
            Ok(_) => debug!("Skipping non-file entry: {}", path.display()),
            Err(e) => warn!("Skipping unreadable entry {}: {}", path.display(), e),
        }
    }

    Ok(entries)
}
