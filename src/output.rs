//! Output types produced by joining a dispatch.

use crate::error::{RenderError, WorkspaceError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The observed completion of one render request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// Document path exactly as it was handed to the renderer.
    pub path: PathBuf,
    /// Wall-clock time between the renderer call and its return, in
    /// milliseconds. Zero for tasks that panicked.
    pub duration_ms: u64,
    /// `None` when the renderer succeeded.
    pub error: Option<RenderError>,
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a fully joined dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Render requests issued.
    pub issued: usize,
    /// Documents the renderer accepted.
    pub succeeded: usize,
    /// Documents that failed or whose task panicked.
    pub failed: usize,
    /// Reset failures tolerated under the best-effort policy.
    pub workspace_failures: Vec<WorkspaceError>,
    /// One entry per issued request, in issue order.
    pub outcomes: Vec<DocumentOutcome>,
    /// From the first reset to the last render completion.
    pub total_duration_ms: u64,
}

impl RunReport {
    /// The errors of every failed document, in issue order.
    pub fn errors(&self) -> impl Iterator<Item = &RenderError> {
        self.outcomes.iter().filter_map(|o| o.error.as_ref())
    }

    /// `true` when every reset and every render succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.workspace_failures.is_empty()
    }
}
