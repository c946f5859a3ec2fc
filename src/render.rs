//! The renderer seam: the request handed out per document and the trait the
//! rendering collaborator implements.
//!
//! The dispatcher never looks inside a [`RenderRequest`]; it only builds one
//! per eligible document and passes it to [`Renderer::render`] on its own
//! task. Two adapters ship with the crate:
//!
//! * [`CommandRenderer`] — runs an external program once per document
//! * [`LogRenderer`]     — dry run that only logs the request

use crate::error::RenderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{debug, info};

/// The inputs for rendering one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub document_path: PathBuf,
    /// Stylesheet URL or path, passed through untouched.
    pub stylesheet: String,
    /// Language tag for the generated markup, e.g. `en-CA`.
    pub language: String,
}

/// Turns one document into markup.
///
/// Implementations must be `Send + Sync`: each request runs on its own
/// spawned task, and several may be in flight at once.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, request: RenderRequest) -> Result<(), RenderError>;
}

/// Runs `program [args..] <document> <stylesheet> <language>` per document.
///
/// A zero exit status is success. Otherwise the tail of stderr is kept in
/// [`RenderError::Failed`].
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: OsString,
    args: Vec<OsString>,
}

/// Characters of stderr kept from a failed renderer run.
const STDERR_TAIL: usize = 2048;

impl CommandRenderer {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Fixed arguments placed before the per-document ones.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, request: RenderRequest) -> Result<(), RenderError> {
        let program = self.program.to_string_lossy().into_owned();
        debug!("Running {} for {}", program, request.document_path.display());

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&request.document_path)
            .arg(&request.stylesheet)
            .arg(&request.language)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RenderError::Spawn {
                path: request.document_path.clone(),
                program: program.clone(),
                detail: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim_end();
        let tail = match stderr.char_indices().nth_back(STDERR_TAIL - 1) {
            Some((idx, _)) => &stderr[idx..],
            None => stderr,
        };

        Err(RenderError::Failed {
            path: request.document_path,
            status: output.status.to_string(),
            stderr: tail.to_string(),
        })
    }
}

/// Accepts every request and records it in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRenderer;

#[async_trait]
impl Renderer for LogRenderer {
    async fn render(&self, request: RenderRequest) -> Result<(), RenderError> {
        info!(
            document = %request.document_path.display(),
            stylesheet = %request.stylesheet,
            language = %request.language,
            "Render request"
        );
        Ok(())
    }
}
