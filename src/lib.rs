//! # docdispatch
//!
//! Resolve a text or Markdown input, reset the output workspaces, and fan
//! every eligible document out to a renderer.
//!
//! The crate owns the part of a static-site build that happens *before* any
//! markup is produced: deciding which files are documents, wiping the
//! previous build, and handing one [`RenderRequest`] per document to
//! whatever [`Renderer`] the caller plugs in.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input path
//!  │
//!  ├─ 1. Reset   wipe and recreate <root>/dist
//!  ├─ 2. Reset   wipe and recreate <root>/assets
//!  ├─ 3. Resolve single .txt/.md file, or the eligible files of a directory
//!  └─ 4. Issue   one spawned render task per document → Dispatch handle
//! ```
//!
//! Only `.txt` and `.md` (exact, case-sensitive) are eligible. Directories
//! are not searched recursively.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc_dispatch::{process_inputs, CommandRenderer, DispatchConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DispatchConfig::builder()
//!         .workspace_root(".")
//!         .concurrency(8)
//!         .build()?;
//!     let renderer = Arc::new(CommandRenderer::new("render-html"));
//!
//!     let dispatch = process_inputs("notes/", "style.css", "en-CA", renderer, &config).await?;
//!     let report = dispatch.join().await;
//!     eprintln!("{}/{} documents rendered", report.succeeded, report.issued);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docdispatch` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod render;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DispatchConfig, DispatchConfigBuilder, ResetOrder, ResetPolicy, WorkspaceLayout};
pub use dispatch::{process_inputs, process_path, Dispatch, Dispatcher};
pub use error::{DispatchError, RenderError, ResetStage, WorkspaceError};
pub use output::{DocumentOutcome, RunReport};
pub use pipeline::input::{is_eligible, InputKind, ResolvedInput, ELIGIBLE_EXTENSIONS};
pub use pipeline::workspace::reset_workspace;
pub use progress::{DispatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use render::{CommandRenderer, LogRenderer, RenderRequest, Renderer};
