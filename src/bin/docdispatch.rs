//! CLI binary for docdispatch.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `DispatchConfig`, picks a renderer, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use doc_dispatch::{
    process_path, CommandRenderer, DispatchConfig, DispatchProgressCallback, Dispatcher,
    LogRenderer, ProgressCallback, Renderer, ResetOrder, ResetPolicy, ResolvedInput,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback. Documents complete out of order, so each
/// line names its own file.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Resetting workspaces…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
    }
}

impl DispatchProgressCallback for CliProgressCallback {
    fn on_dispatch_start(&self, total_documents: usize) {
        self.activate_bar(total_documents);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Dispatching {total_documents} documents…"))
        ));
    }

    fn on_document_start(&self, path: &Path) {
        self.bar.set_message(path.display().to_string());
    }

    fn on_document_complete(&self, path: &Path, duration_ms: u64) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            path.display(),
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, path: &Path, error: &str) {
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            path.display(),
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_dispatch_complete(&self, total_documents: usize, success_count: usize) {
        let failed = total_documents.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents rendered",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents rendered  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Dry run: reset ./dist and ./assets, log what would be rendered
  docdispatch notes/

  # Render every .txt/.md file in a directory with an external program
  docdispatch --renderer ./render-html --stylesheet https://cdn.example/water.css notes/

  # One file, French markup, at most 4 renders at a time
  docdispatch --renderer pandoc-wrapper --lang fr -c 4 essay.md

  # Check what would be picked up, without touching any workspace
  docdispatch --resolve-only notes/

  # Keep the previous build if the input is rejected
  docdispatch --validate-first --renderer ./render-html notes/

RENDERER CONTRACT:
  The renderer program is run once per document as
    <renderer> [--renderer-arg ...] <document> <stylesheet> <lang>
  Exit status 0 means success. stderr is reported on failure.

ENVIRONMENT VARIABLES:
  DOCDISPATCH_ROOT         Workspace root (dist/ and assets/ live here)
  DOCDISPATCH_RENDERER     Renderer program
  DOCDISPATCH_STYLESHEET   Stylesheet URL passed to the renderer
  DOCDISPATCH_LANG         Language tag passed to the renderer
  RUST_LOG                 Override log filter (e.g. doc_dispatch=debug)
"#;

/// Reset output workspaces and dispatch .txt/.md documents to a renderer.
#[derive(Parser, Debug)]
#[command(
    name = "docdispatch",
    version,
    about = "Reset output workspaces and dispatch .txt/.md documents to a renderer",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A .txt/.md file, or a directory of them.
    input: PathBuf,

    /// Stylesheet URL or path handed to the renderer.
    #[arg(short, long, env = "DOCDISPATCH_STYLESHEET", default_value = "")]
    stylesheet: String,

    /// Language tag handed to the renderer.
    #[arg(short, long, env = "DOCDISPATCH_LANG", default_value = "en-CA")]
    lang: String,

    /// Workspace root; dist/ and assets/ are created under it.
    #[arg(long, env = "DOCDISPATCH_ROOT", default_value = ".")]
    root: PathBuf,

    /// Override the render-output workspace.
    #[arg(long, env = "DOCDISPATCH_DIST_DIR")]
    dist_dir: Option<PathBuf>,

    /// Override the assets workspace.
    #[arg(long, env = "DOCDISPATCH_ASSETS_DIR")]
    assets_dir: Option<PathBuf>,

    /// Program run once per document. Without it, requests are only logged.
    #[arg(short, long, env = "DOCDISPATCH_RENDERER")]
    renderer: Option<PathBuf>,

    /// Extra argument placed before the per-document ones (repeatable).
    #[arg(long = "renderer-arg", allow_hyphen_values = true)]
    renderer_args: Vec<String>,

    /// Maximum renders in flight. Unbounded when omitted.
    #[arg(short, long, env = "DOCDISPATCH_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Abort if a workspace cannot be reset.
    #[arg(long, env = "DOCDISPATCH_STRICT_RESET")]
    strict_reset: bool,

    /// Validate the input before wiping the workspaces.
    #[arg(long, env = "DOCDISPATCH_VALIDATE_FIRST")]
    validate_first: bool,

    /// Print the eligible documents and exit; no workspace is touched.
    #[arg(long)]
    resolve_only: bool,

    /// Print the run report as JSON.
    #[arg(long, env = "DOCDISPATCH_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCDISPATCH_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCDISPATCH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCDISPATCH_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // A dry run has no renderer output, so its log lines are the output.
    let dry_run = cli.renderer.is_none();
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.resolve_only && !dry_run;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve-only mode ────────────────────────────────────────────────
    if cli.resolve_only {
        let resolved = process_path(&cli.input)
            .await
            .with_context(|| format!("Failed to resolve {}", cli.input.display()))?;
        print_resolved(&resolved, cli.json)?;
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let cli_progress = show_progress.then(CliProgressCallback::new);
    // The spinner ticks on its own thread; clear it before any error is printed.
    let clear_progress = || {
        if let Some(cb) = &cli_progress {
            cb.bar.finish_and_clear();
        }
    };
    let progress_cb = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn DispatchProgressCallback>);
    let config = build_config(&cli, progress_cb).inspect_err(|_| clear_progress())?;

    let renderer: Arc<dyn Renderer> = match cli.renderer {
        Some(ref program) => Arc::new(
            CommandRenderer::new(program.as_os_str()).args(cli.renderer_args.iter()),
        ),
        None => Arc::new(LogRenderer),
    };

    // ── Run dispatch ─────────────────────────────────────────────────────
    let report = Dispatcher::new(renderer, config)
        .run_to_completion(&cli.input, cli.stylesheet.as_str(), cli.lang.as_str())
        .await
        .inspect_err(|_| clear_progress())
        .context("Dispatch failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        for failure in &report.workspace_failures {
            eprintln!("{} {}", cyan("⚠"), failure);
        }
        if !show_progress {
            eprintln!(
                "Rendered {}/{} documents in {}ms",
                report.succeeded, report.issued, report.total_duration_ms
            );
            for err in report.errors() {
                eprintln!("  {} {}", red("✗"), err);
            }
        }
    }

    if report.failed > 0 {
        anyhow::bail!("{} of {} documents failed to render", report.failed, report.issued);
    }

    Ok(())
}

/// Map CLI args to `DispatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<DispatchConfig> {
    let mut builder = DispatchConfig::builder()
        .workspace_root(&cli.root)
        .reset_policy(if cli.strict_reset {
            ResetPolicy::Strict
        } else {
            ResetPolicy::BestEffort
        })
        .reset_order(if cli.validate_first {
            ResetOrder::ValidateThenReset
        } else {
            ResetOrder::ResetThenValidate
        });

    if let Some(ref dir) = cli.dist_dir {
        builder = builder.render_output_dir(dir);
    }
    if let Some(ref dir) = cli.assets_dir {
        builder = builder.assets_dir(dir);
    }
    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_resolved(resolved: &ResolvedInput, json: bool) -> Result<()> {
    let paths = resolved.document_paths();
    if json {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "kind": resolved.kind(),
            "documents": paths,
        }))
        .context("Failed to serialise documents")?;
        println!("{json}");
    } else {
        for path in &paths {
            println!("{}", path.display());
        }
        if paths.is_empty() {
            eprintln!("{}", dim("no eligible documents"));
        }
    }
    Ok(())
}
