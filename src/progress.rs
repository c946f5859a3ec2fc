//! Progress-callback trait for per-document dispatch events.
//!
//! Inject an [`Arc<dyn DispatchProgressCallback>`] via
//! [`crate::config::DispatchConfigBuilder::progress_callback`] to receive
//! events as render tasks start and finish.
//!
//! # Example
//!
//! ```rust
//! use doc_dispatch::{DispatchConfig, DispatchProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl DispatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, path: &Path, duration_ms: u64) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} rendered in {duration_ms}ms", path.display());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = DispatchConfig::builder()
//!     .progress_callback(counter as Arc<dyn DispatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the dispatcher as render tasks progress.
///
/// Render tasks run concurrently on the tokio runtime, so the per-document
/// methods may be called from several threads at once. All methods default
/// to no-ops.
pub trait DispatchProgressCallback: Send + Sync {
    /// Called once, after both resets and resolution, before the first
    /// request is issued.
    ///
    /// # Arguments
    /// * `total_documents` — number of render requests about to be issued
    fn on_dispatch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called inside the render task just before the renderer is invoked
    /// (after any concurrency permit has been acquired).
    fn on_document_start(&self, path: &Path) {
        let _ = path;
    }

    /// Called when the renderer reports success for a document.
    fn on_document_complete(&self, path: &Path, duration_ms: u64) {
        let _ = (path, duration_ms);
    }

    /// Called when the renderer reports failure for a document.
    ///
    /// A panicking renderer never reaches this hook; the panic is only
    /// visible through [`crate::dispatch::Dispatch::join`].
    fn on_document_error(&self, path: &Path, error: &str) {
        let _ = (path, error);
    }

    /// Called by [`crate::dispatch::Dispatch::join`] once every task is done.
    /// Never fired for a detached dispatch.
    ///
    /// # Arguments
    /// * `total_documents` — number of requests issued
    /// * `success_count`   — documents the renderer accepted
    fn on_dispatch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl DispatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DispatchConfig`].
pub type ProgressCallback = Arc<dyn DispatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_dispatch_start(2);
        cb.on_document_start(Path::new("a.md"));
        cb.on_document_complete(Path::new("a.md"), 12);
        cb.on_document_error(Path::new("b.txt"), "renderer exited with 1");
        cb.on_dispatch_complete(2, 1);
    }
}
