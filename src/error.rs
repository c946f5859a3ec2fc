//! Error types for the docdispatch library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`DispatchError`] — **Fatal**: the run cannot proceed at all (input
//!   missing, unsupported extension, strict workspace reset failed).
//!   Returned as `Err(DispatchError)` from [`crate::process_inputs`] and
//!   [`crate::process_path`].
//!
//! * [`WorkspaceError`] — **Recoverable**: an output directory could not be
//!   cleared or recreated. Under [`crate::config::ResetPolicy::BestEffort`]
//!   it is logged and recorded on the [`crate::dispatch::Dispatch`] instead of
//!   aborting the run.
//!
//! * [`RenderError`] — **Per document**: the renderer failed for one file.
//!   Only observed when the caller joins the dispatch; stored inside
//!   [`crate::output::DocumentOutcome`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docdispatch library.
#[derive(Debug, Error)]
pub enum DispatchError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input path does not exist.
    #[error("File/directory does not exist: '{path}'")]
    NotFound { path: PathBuf },

    /// A single-file input has an extension outside the allow-list.
    #[error("File extension must be '.txt' or '.md', got {extension:?} for '{path}'")]
    UnsupportedExtension {
        path: PathBuf,
        /// The offending extension including the leading dot, or empty.
        extension: String,
    },

    /// Process does not have permission to inspect the input.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other filesystem failure while resolving the input.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Workspace errors ──────────────────────────────────────────────────
    /// A workspace reset failed and the reset policy is `Strict`.
    #[error(transparent)]
    WorkspaceReset(#[from] WorkspaceError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Map an I/O error raised while inspecting `path` onto the taxonomy.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            // `notes.md/` reports NotADirectory; nothing exists at that path.
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                DispatchError::NotFound { path }
            }
            std::io::ErrorKind::PermissionDenied => DispatchError::PermissionDenied { path },
            _ => DispatchError::Io { path, source },
        }
    }
}

/// Which half of a workspace reset failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetStage {
    /// Removing the previous contents.
    Remove,
    /// Creating the fresh directory.
    Create,
}

impl fmt::Display for ResetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetStage::Remove => f.write_str("remove"),
            ResetStage::Create => f.write_str("create"),
        }
    }
}

/// A workspace directory could not be reset.
///
/// Carries the error text rather than the `io::Error` itself so it can be
/// cloned into reports and serialised.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Failed to reset workspace '{path}' ({stage}): {detail}")]
pub struct WorkspaceError {
    pub path: PathBuf,
    pub stage: ResetStage,
    pub detail: String,
}

/// A non-fatal error for a single document.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum RenderError {
    /// The external renderer program could not be started.
    #[error("'{path}': could not start renderer '{program}': {detail}")]
    Spawn {
        path: PathBuf,
        program: String,
        detail: String,
    },

    /// The renderer ran and reported failure.
    #[error("'{path}': renderer exited with {status}: {stderr}")]
    Failed {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    /// The render task panicked.
    #[error("'{path}': render task panicked: {detail}")]
    Panicked { path: PathBuf, detail: String },

    /// A custom renderer rejected the document.
    #[error("'{path}': {detail}")]
    Rejected { path: PathBuf, detail: String },
}

impl RenderError {
    /// The document this error belongs to.
    pub fn path(&self) -> &PathBuf {
        match self {
            RenderError::Spawn { path, .. }
            | RenderError::Failed { path, .. }
            | RenderError::Panicked { path, .. }
            | RenderError::Rejected { path, .. } => path,
        }
    }
}
