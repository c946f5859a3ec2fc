//! The conversion dispatcher: reset workspaces, resolve the input, and fan
//! one render request per document out to the renderer.
//!
//! ## Issued, not completed
//!
//! [`Dispatcher::run`] returns as soon as every request has been *issued*
//! (spawned onto the tokio runtime). The returned [`Dispatch`] is the task
//! group for those renders: [`Dispatch::join`] waits for all of them and
//! collects per-document failures, while [`Dispatch::detach`] lets them run
//! unsupervised.

use crate::config::{DispatchConfig, ResetOrder, ResetPolicy};
use crate::error::{DispatchError, RenderError, WorkspaceError};
use crate::output::{DocumentOutcome, RunReport};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::workspace;
use crate::progress::ProgressCallback;
use crate::render::{RenderRequest, Renderer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

/// Resets workspaces and dispatches documents to a [`Renderer`].
#[derive(Clone)]
pub struct Dispatcher {
    renderer: Arc<dyn Renderer>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(renderer: Arc<dyn Renderer>, config: DispatchConfig) -> Self {
        Self { renderer, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Reset both workspaces, resolve `input`, and issue one render request
    /// per resolved document.
    ///
    /// # Errors
    /// Only resolution errors ([`DispatchError::NotFound`],
    /// [`DispatchError::UnsupportedExtension`], and I/O failures) propagate,
    /// plus [`DispatchError::WorkspaceReset`] under [`ResetPolicy::Strict`].
    /// Render failures are never returned here; join the dispatch to see them.
    ///
    /// Under [`ResetOrder::ResetThenValidate`] a rejected input has already
    /// wiped both workspaces by the time the error is returned.
    pub async fn run(
        &self,
        input: impl AsRef<Path>,
        stylesheet: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Dispatch, DispatchError> {
        let started = Instant::now();
        let input = input.as_ref();
        info!("Starting dispatch: {}", input.display());

        let mut workspace_failures = Vec::new();
        let resolved = match self.config.reset_order {
            ResetOrder::ResetThenValidate => {
                self.reset_workspaces(&mut workspace_failures).await?;
                input::resolve_input(input).await?
            }
            ResetOrder::ValidateThenReset => {
                let resolved = input::resolve_input(input).await?;
                self.reset_workspaces(&mut workspace_failures).await?;
                resolved
            }
        };

        let stylesheet = stylesheet.into();
        let language = language.into();
        let documents = resolved.document_paths();
        info!("Dispatching {} documents", documents.len());

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_dispatch_start(documents.len());
        }

        let limiter = self.config.concurrency.map(|n| Arc::new(Semaphore::new(n)));
        let tasks = documents
            .into_iter()
            .map(|document_path| {
                let request = RenderRequest {
                    document_path: document_path.clone(),
                    stylesheet: stylesheet.clone(),
                    language: language.clone(),
                };
                let handle = tokio::spawn(render_one(
                    Arc::clone(&self.renderer),
                    request,
                    limiter.clone(),
                    self.config.progress_callback.clone(),
                ));
                (document_path, handle)
            })
            .collect();

        Ok(Dispatch {
            resolved,
            workspace_failures,
            tasks,
            progress: self.config.progress_callback.clone(),
            started,
        })
    }

    /// [`Self::run`] followed by [`Dispatch::join`].
    pub async fn run_to_completion(
        &self,
        input: impl AsRef<Path>,
        stylesheet: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<RunReport, DispatchError> {
        Ok(self.run(input, stylesheet, language).await?.join().await)
    }

    /// Reset render-output, then assets. Each reset completes before the
    /// next begins.
    async fn reset_workspaces(
        &self,
        failures: &mut Vec<WorkspaceError>,
    ) -> Result<(), DispatchError> {
        let layout = &self.config.workspaces;
        for dir in [&layout.render_output, &layout.assets] {
            if let Err(e) = workspace::reset_workspace(dir).await {
                match self.config.reset_policy {
                    ResetPolicy::Strict => return Err(e.into()),
                    ResetPolicy::BestEffort => {
                        warn!("{}; continuing", e);
                        failures.push(e);
                    }
                }
            }
        }
        Ok(())
    }
}

/// The render tasks issued by one run.
///
/// Dropping a `Dispatch` (or calling [`Self::detach`]) leaves the tasks
/// running; nothing is aborted.
pub struct Dispatch {
    resolved: ResolvedInput,
    workspace_failures: Vec<WorkspaceError>,
    tasks: Vec<(PathBuf, JoinHandle<DocumentOutcome>)>,
    progress: Option<ProgressCallback>,
    started: Instant,
}

impl Dispatch {
    /// Number of render requests issued.
    pub fn issued(&self) -> usize {
        self.tasks.len()
    }

    /// The document set the requests were built from.
    pub fn resolved(&self) -> &ResolvedInput {
        &self.resolved
    }

    /// Reset failures tolerated under [`ResetPolicy::BestEffort`].
    pub fn workspace_failures(&self) -> &[WorkspaceError] {
        &self.workspace_failures
    }

    /// `true` once every render task has finished.
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|(_, handle)| handle.is_finished())
    }

    /// Wait for every render and collect the outcomes in issue order.
    pub async fn join(self) -> RunReport {
        let (paths, handles): (Vec<PathBuf>, Vec<_>) = self.tasks.into_iter().unzip();
        let issued = paths.len();

        let outcomes: Vec<DocumentOutcome> = futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(paths)
            .map(|(joined, path)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    let detail = join_error_detail(e);
                    warn!("Render task for {} died: {}", path.display(), detail);
                    DocumentOutcome {
                        path: path.clone(),
                        duration_ms: 0,
                        error: Some(RenderError::Panicked { path, detail }),
                    }
                }
            })
            .collect();

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = issued - succeeded;

        if let Some(ref cb) = self.progress {
            cb.on_dispatch_complete(issued, succeeded);
        }

        let total_duration_ms = self.started.elapsed().as_millis() as u64;
        info!(
            "Dispatch complete: {}/{} documents rendered, {}ms total",
            succeeded, issued, total_duration_ms
        );

        RunReport {
            issued,
            succeeded,
            failed,
            workspace_failures: self.workspace_failures,
            outcomes,
            total_duration_ms,
        }
    }

    /// Stop supervising the renders. They keep running, and their outcomes
    /// are never observed.
    pub fn detach(self) {
        debug!("Detached {} render tasks", self.tasks.len());
    }
}

/// Reset both workspaces, resolve `input`, and issue one render request per
/// document.
///
/// Convenience over [`Dispatcher::run`] for one-off runs.
///
/// # Example
/// ```rust,no_run
/// use doc_dispatch::{process_inputs, DispatchConfig, LogRenderer};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), doc_dispatch::DispatchError> {
/// let config = DispatchConfig::builder().workspace_root("site").build()?;
/// let dispatch = process_inputs("notes/", "style.css", "en-CA", Arc::new(LogRenderer), &config).await?;
/// let report = dispatch.join().await;
/// println!("{}/{} rendered", report.succeeded, report.issued);
/// # Ok(())
/// # }
/// ```
pub async fn process_inputs(
    input: impl AsRef<Path>,
    stylesheet: impl Into<String>,
    language: impl Into<String>,
    renderer: Arc<dyn Renderer>,
    config: &DispatchConfig,
) -> Result<Dispatch, DispatchError> {
    Dispatcher::new(renderer, config.clone())
        .run(input, stylesheet, language)
        .await
}

/// Resolve `input` without touching any workspace or renderer.
pub async fn process_path(input: impl AsRef<Path>) -> Result<ResolvedInput, DispatchError> {
    input::resolve_input(input.as_ref()).await
}

async fn render_one(
    renderer: Arc<dyn Renderer>,
    request: RenderRequest,
    limiter: Option<Arc<Semaphore>>,
    progress: Option<ProgressCallback>,
) -> DocumentOutcome {
    // The semaphore is never closed, so acquisition only fails if that changes.
    let _permit = match limiter {
        Some(sem) => sem.acquire_owned().await.ok(),
        None => None,
    };

    let path = request.document_path.clone();
    if let Some(ref cb) = progress {
        cb.on_document_start(&path);
    }

    let start = Instant::now();
    let result = renderer.render(request).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match &result {
        Ok(()) => {
            debug!("Rendered {} in {}ms", path.display(), duration_ms);
            if let Some(ref cb) = progress {
                cb.on_document_complete(&path, duration_ms);
            }
        }
        Err(e) => {
            warn!("Render failed: {}", e);
            if let Some(ref cb) = progress {
                cb.on_document_error(&path, &e.to_string());
            }
        }
    }

    DocumentOutcome {
        path,
        duration_ms,
        error: result.err(),
    }
}

fn join_error_detail(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<RenderRequest>>,
    }

    #[async_trait]
    impl Renderer for Recorder {
        async fn render(&self, request: RenderRequest) -> Result<(), RenderError> {
            self.requests.lock().unwrap().push(request);
            Ok(())
        }
    }

    struct Panicker;

    #[async_trait]
    impl Renderer for Panicker {
        async fn render(&self, request: RenderRequest) -> Result<(), RenderError> {
            if request.document_path.ends_with("bad.md") {
                panic!("renderer exploded");
            }
            Ok(())
        }
    }

    fn config_in(tmp: &TempDir) -> DispatchConfig {
        DispatchConfig::builder()
            .workspace_root(tmp.path().join("out"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn requests_carry_stylesheet_and_language() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("notes.md");
        std::fs::write(&doc, "# hi").unwrap();

        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(recorder.clone(), config_in(&tmp));
        let report = dispatcher
            .run_to_completion(&doc, "https://cdn.example/a.css", "fr")
            .await
            .unwrap();

        assert_eq!(report.issued, 1);
        let requests = recorder.requests.lock().unwrap();
        assert_eq!(
            requests[0],
            RenderRequest {
                document_path: doc.clone(),
                stylesheet: "https://cdn.example/a.css".into(),
                language: "fr".into(),
            }
        );
    }

    #[tokio::test]
    async fn panicking_render_is_collected() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        std::fs::create_dir(&docs).unwrap();
        std::fs::write(docs.join("good.md"), "ok").unwrap();
        std::fs::write(docs.join("bad.md"), "boom").unwrap();

        let dispatch = Dispatcher::new(Arc::new(Panicker), config_in(&tmp))
            .run(&docs, "s.css", "en")
            .await
            .unwrap();
        let report = dispatch.join().await;

        assert_eq!(report.issued, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        let err = report.errors().next().unwrap();
        match err {
            RenderError::Panicked { path, detail } => {
                assert!(path.ends_with("bad.md"));
                assert!(detail.contains("renderer exploded"), "got: {detail}");
            }
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_directory_issues_nothing() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        std::fs::create_dir(&docs).unwrap();

        let renderer = Arc::new(Recorder::default());
        let dispatch = process_inputs(&docs, "s.css", "en", renderer, &config_in(&tmp))
            .await
            .unwrap();
        assert_eq!(dispatch.issued(), 0);
        assert!(dispatch.is_finished());
        assert!(dispatch.resolved().is_empty());

        let report = dispatch.join().await;
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn process_path_leaves_workspaces_alone() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        std::fs::create_dir_all(&config.workspaces.render_output).unwrap();
        let keep = config.workspaces.render_output.join("index.html");
        std::fs::write(&keep, "old").unwrap();

        let doc = tmp.path().join("a.txt");
        std::fs::write(&doc, "text").unwrap();
        let resolved = process_path(&doc).await.unwrap();

        assert_eq!(resolved, ResolvedInput::Single(doc));
        assert!(keep.is_file());
    }
}
