//! Configuration types for a dispatch run.
//!
//! All run behaviour is controlled through [`DispatchConfig`], built via its
//! [`DispatchConfigBuilder`]. Workspace locations are explicit inputs here;
//! nothing is derived from where the program is installed.

use crate::error::DispatchError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the render-output workspace under a workspace root.
pub const RENDER_OUTPUT_DIR: &str = "dist";

/// Name of the assets workspace under a workspace root.
pub const ASSETS_DIR: &str = "assets";

/// The two output directories owned by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceLayout {
    /// Directory the renderer writes markup into.
    pub render_output: PathBuf,
    /// Directory for stylesheets, images and other renderer assets.
    pub assets: PathBuf,
}

impl WorkspaceLayout {
    /// `<root>/dist` and `<root>/assets`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            render_output: root.join(RENDER_OUTPUT_DIR),
            assets: root.join(ASSETS_DIR),
        }
    }
}

impl Default for WorkspaceLayout {
    fn default() -> Self {
        Self::under(".")
    }
}

/// What to do when a workspace reset fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResetPolicy {
    /// Log the failure, record it on the dispatch, and keep going. (default)
    #[default]
    BestEffort,
    /// Abort the run with [`DispatchError::WorkspaceReset`].
    Strict,
}

/// Whether input validation happens before or after the destructive resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResetOrder {
    /// Wipe both workspaces, then resolve the input. A rejected input still
    /// leaves the workspaces empty. (default)
    #[default]
    ResetThenValidate,
    /// Resolve the input first; a rejected input leaves prior output intact.
    ValidateThenReset,
}

/// Configuration for a dispatch run.
///
/// # Example
/// ```rust
/// use doc_dispatch::{DispatchConfig, ResetPolicy};
///
/// let config = DispatchConfig::builder()
///     .workspace_root("site")
///     .concurrency(4)
///     .reset_policy(ResetPolicy::Strict)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, Some(4));
/// ```
#[derive(Clone, Default)]
pub struct DispatchConfig {
    /// Output directories reset at the start of every run.
    pub workspaces: WorkspaceLayout,

    /// Failure handling for workspace resets. Default: [`ResetPolicy::BestEffort`].
    pub reset_policy: ResetPolicy,

    /// Validation vs. reset ordering. Default: [`ResetOrder::ResetThenValidate`].
    pub reset_order: ResetOrder,

    /// Maximum number of renders in flight. `None` (default) is unbounded.
    ///
    /// The bound is enforced inside each render task, so issuing requests
    /// never waits on it.
    pub concurrency: Option<usize>,

    /// Optional progress sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("workspaces", &self.workspaces)
            .field("reset_policy", &self.reset_policy)
            .field("reset_order", &self.reset_order)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn DispatchProgressCallback>"),
            )
            .finish()
    }
}

impl DispatchConfig {
    /// Create a new builder for `DispatchConfig`.
    pub fn builder() -> DispatchConfigBuilder {
        DispatchConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`DispatchConfig`].
#[derive(Debug)]
pub struct DispatchConfigBuilder {
    config: DispatchConfig,
}

impl DispatchConfigBuilder {
    /// Place both workspaces under `root`.
    pub fn workspace_root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.workspaces = WorkspaceLayout::under(root);
        self
    }

    pub fn workspaces(mut self, layout: WorkspaceLayout) -> Self {
        self.config.workspaces = layout;
        self
    }

    pub fn render_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspaces.render_output = dir.into();
        self
    }

    pub fn assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspaces.assets = dir.into();
        self
    }

    pub fn reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.config.reset_policy = policy;
        self
    }

    pub fn reset_order(mut self, order: ResetOrder) -> Self {
        self.config.reset_order = order;
        self
    }

    /// Bound in-flight renders. Zero is rejected by [`Self::build`].
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = Some(n);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.config.concurrency = None;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DispatchConfig, DispatchError> {
        let c = &self.config;
        if c.concurrency == Some(0) {
            return Err(DispatchError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.workspaces.render_output.as_os_str().is_empty()
            || c.workspaces.assets.as_os_str().is_empty()
        {
            return Err(DispatchError::InvalidConfig(
                "Workspace directories must not be empty paths".into(),
            ));
        }
        if c.workspaces.render_output == c.workspaces.assets {
            return Err(DispatchError::InvalidConfig(format!(
                "Render-output and assets workspaces must differ (both '{}')",
                c.workspaces.assets.display()
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_behaviour() {
        let c = DispatchConfig::default();
        assert_eq!(c.workspaces.render_output, Path::new("./dist"));
        assert_eq!(c.workspaces.assets, Path::new("./assets"));
        assert_eq!(c.reset_policy, ResetPolicy::BestEffort);
        assert_eq!(c.reset_order, ResetOrder::ResetThenValidate);
        assert_eq!(c.concurrency, None);
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn workspace_root_sets_both_dirs() {
        let c = DispatchConfig::builder()
            .workspace_root("/srv/site")
            .build()
            .unwrap();
        assert_eq!(c.workspaces.render_output, Path::new("/srv/site/dist"));
        assert_eq!(c.workspaces.assets, Path::new("/srv/site/assets"));
    }

    #[test]
    fn individual_dirs_override_root() {
        let c = DispatchConfig::builder()
            .workspace_root("root")
            .assets_dir("static")
            .build()
            .unwrap();
        assert_eq!(c.workspaces.render_output, Path::new("root/dist"));
        assert_eq!(c.workspaces.assets, Path::new("static"));
    }

    #[test]
    fn zero_concurrency_rejected() {
        let err = DispatchConfig::builder().concurrency(0).build().unwrap_err();
        assert!(matches!(err, DispatchError::InvalidConfig(_)));
    }

    #[test]
    fn unbounded_clears_limit() {
        let c = DispatchConfig::builder()
            .concurrency(3)
            .unbounded()
            .build()
            .unwrap();
        assert_eq!(c.concurrency, None);
    }

    #[test]
    fn identical_workspaces_rejected() {
        let err = DispatchConfig::builder()
            .render_output_dir("out")
            .assets_dir("out")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must differ"), "got: {err}");
    }

    #[test]
    fn debug_hides_callback() {
        let cb: ProgressCallback = std::sync::Arc::new(crate::progress::NoopProgressCallback);
        let c = DispatchConfig::builder().progress_callback(cb).build().unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn DispatchProgressCallback>"), "got: {dbg}");
    }
}
