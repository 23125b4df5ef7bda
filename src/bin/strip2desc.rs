//! CLI binary for strip2desc.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to the config types and prints descriptions as they arrive.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strip2desc::config::DEFAULT_MODEL;
use strip2desc::{
    describe_file, description_block, run_pipeline, ConfluenceClient, ConfluenceSettings,
    Deployment, DescriptionProvider, GeminiClient, GeminiSettings, Page, PipelineConfig,
    RunProgressCallback, RunStats, SkipReason, Strip2DescError, WikiSource,
};
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

// ── CLI progress callback ────────────────────────────────────────────────────

/// Terminal callback: status lines on stderr (above an optional progress
/// bar), `# title` + description on stdout.
struct CliProgressCallback {
    /// Progress bar over child pages; `None` with `--no-progress`.
    bar: Option<ProgressBar>,
    /// Suppress status lines (descriptions are still printed).
    quiet: bool,
    /// Print descriptions as they arrive; off in `--json` mode.
    print_descriptions: bool,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new(show_progress: bool, quiet: bool, print_descriptions: bool) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new(0);
            let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(spinner_style);
            bar.set_prefix("Searching");
            bar.set_message("child pages…");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });

        Arc::new(Self {
            bar,
            quiet,
            print_descriptions,
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let Some(bar) = &self.bar else { return };
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_length(total as u64);
        bar.set_style(progress_style);
        bar.set_prefix("Describing");
    }

    fn status(&self, line: String) {
        if self.quiet {
            return;
        }
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_discovery_start(&self, _parent_id: &str) {
        self.status(format!("{} Searching for child pages.", cyan("◆")));
    }

    fn on_discovery_complete(&self, found: usize) {
        self.activate_bar(found);
        self.status(format!("{} Found {} child pages.", cyan("◆"), bold(&found.to_string())));
    }

    fn on_discovery_failed(&self, error: &str) {
        // Shown even with --quiet: an empty run must say why it is empty.
        let line = format!("{} No child pages found: {}", red("✘"), red(error));
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn on_page_start(&self, _index: usize, _total: usize, page: &Page) {
        if let Some(bar) = &self.bar {
            bar.set_message(page.title.clone());
        }
        self.status(format!("Child page {}, title {}.", page.id, page.title));
    }

    fn on_page_skipped(&self, _page: &Page, reason: &SkipReason) {
        self.status(format!("  {} {}, skipping.", dim("–"), dim(&reason.to_string())));
        self.advance();
    }

    fn on_cache_hit(&self, _page: &Page, path: &Path) {
        self.status(format!("  {} cached {}", dim("•"), dim(&path.display().to_string())));
    }

    fn on_export_start(&self, _page: &Page, path: &Path) {
        self.status(format!(
            "  {} PDF file missing, exporting page to {}",
            cyan("↓"),
            path.display()
        ));
    }

    fn on_export_complete(&self, _page: &Page, _path: &Path, bytes: usize) {
        self.status(format!("  {} done {}", green("✓"), dim(&format!("({bytes} bytes)"))));
    }

    fn on_page_error(&self, _page: &Page, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(120) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error.to_string(),
        };
        self.status(format!("  {} failed: {}", red("✗"), red(&msg)));
        self.advance();
    }

    fn on_description(&self, page: &Page, description: &str) {
        if self.print_descriptions {
            let print = || println!("{}", description_block(&page.title, description));
            match &self.bar {
                Some(bar) => bar.suspend(print),
                None => print(),
            }
        }
        self.advance();
    }

    fn on_run_complete(&self, stats: &RunStats) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        if self.quiet || stats.found == 0 {
            return;
        }
        let mark = if stats.failed == 0 { green("✔") } else { cyan("⚠") };
        eprintln!(
            "{} {} described, {} skipped, {} failed  {}",
            mark,
            bold(&stats.described.to_string()),
            stats.skipped,
            if stats.failed == 0 {
                stats.failed.to_string()
            } else {
                red(&stats.failed.to_string())
            },
            dim(&format!(
                "({} exported, {} cached, {}ms)",
                stats.exported, stats.cache_hits, stats.total_duration_ms
            )),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Describe every strip component below CONFLUENCE_PAGE_ID
  strip2desc

  # Keep exported PDFs in a separate directory
  strip2desc --cache-dir exports

  # Describe one local PDF, no Confluence access needed
  strip2desc "exports/[Hero Banner] Intro.pdf"

  # Machine-readable report
  strip2desc --json > report.json

ENVIRONMENT VARIABLES (also read from ./.env):
  CONFLUENCE_URL          Site URL incl. context path, e.g. https://acme.atlassian.net/wiki
  CONFLUENCE_USERNAME     Account e-mail (Cloud) or user name (Server)
  CONFLUENCE_API_TOKEN    API token (Cloud) or password (Server)
  CONFLUENCE_PAGE_ID      Parent page whose children are described
  GEMINI_API_KEY          Google Gemini API key
  STRIP2DESC_MODEL        Override model ID (default gemini-2.5-flash)

CACHING:
  Exported PDFs are stored as "<page title>.pdf" with \ / : * ? " < > |
  replaced by "_". An existing file is always reused; delete it to force a
  fresh export.
"#;

/// Describe Confluence strip-component pages with Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "strip2desc",
    version,
    about = "Describe Confluence strip-component pages with Gemini",
    long_about = "Export every strip-component child page of a Confluence page as PDF \
(cached locally by title) and let Gemini write a short, non-technical description of each. \
Pass a PDF path to describe a single local file instead.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Describe this local PDF only; Confluence is not contacted.
    pdf_path: Option<PathBuf>,

    /// Confluence site URL including the context path.
    #[arg(long, env = "CONFLUENCE_URL")]
    confluence_url: Option<String>,

    /// Confluence user name or account e-mail.
    #[arg(long, env = "CONFLUENCE_USERNAME")]
    confluence_username: Option<String>,

    /// Confluence API token.
    #[arg(long, env = "CONFLUENCE_API_TOKEN", hide_env_values = true)]
    confluence_api_token: Option<String>,

    /// Parent page whose direct children are processed.
    #[arg(long, env = "CONFLUENCE_PAGE_ID")]
    page_id: Option<String>,

    /// Google Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Gemini model ID.
    #[arg(long, env = "STRIP2DESC_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Directory for exported PDFs.
    #[arg(long, env = "STRIP2DESC_CACHE_DIR", default_value = ".")]
    cache_dir: PathBuf,

    /// Maximum number of child pages requested.
    #[arg(long, env = "STRIP2DESC_LIMIT", default_value_t = 100,
          value_parser = clap::value_parser!(u16).range(1..=1000))]
    limit: u16,

    /// Confluence Server / Data Center (direct PDF export instead of Cloud export tasks).
    #[arg(long, env = "CONFLUENCE_SERVER")]
    server: bool,

    /// Seconds between polls of a Cloud export task.
    #[arg(long, env = "STRIP2DESC_POLL_INTERVAL", default_value_t = 3)]
    poll_interval: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "STRIP2DESC_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Print the run report as JSON instead of Markdown-style text.
    #[arg(long, env = "STRIP2DESC_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "STRIP2DESC_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "STRIP2DESC_VERBOSE")]
    verbose: bool,

    /// Suppress status lines; only descriptions and errors are printed.
    #[arg(short, long, env = "STRIP2DESC_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Values from .env win over variables already exported in the shell.
    if let Ok(pairs) = dotenv::dotenv_iter() {
        apply_overriding(pairs);
    }
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs duplicate the status lines; only show them on request.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || !cli.no_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let timeout = Duration::from_secs(cli.timeout.max(1));
    let gemini = GeminiSettings::new(cli.gemini_api_key.clone().unwrap_or_default())
        .with_model(&cli.model);
    let provider: Arc<dyn DescriptionProvider> =
        Arc::new(GeminiClient::new(gemini, timeout).context("Invalid Gemini configuration")?);

    // ── Direct mode ──────────────────────────────────────────────────────
    if let Some(ref path) = cli.pdf_path {
        if !cli.quiet {
            eprintln!("Calling Gemini API with specified PDF: {}", path.display());
        }
        match describe_file(path, &provider).await {
            Ok(text) => {
                if cli.json {
                    let json = serde_json::json!({
                        "pdf_path": path,
                        "description": text,
                    });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                } else {
                    println!("{text}");
                }
            }
            Err(e @ (Strip2DescError::FileNotFound { .. } | Strip2DescError::NotAPdf { .. })) => {
                eprintln!("{} {}", red("✘"), e);
            }
            Err(e) => {
                eprintln!("{} Gemini API call failed: {}", red("✘"), e);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let callback = CliProgressCallback::new(show_progress, cli.quiet || cli.json, !cli.json);

    let config = PipelineConfig::builder()
        .parent_page_id(cli.page_id.clone().unwrap_or_default())
        .cache_dir(cli.cache_dir.clone())
        .search_limit(cli.limit as usize)
        .request_timeout_secs(cli.timeout)
        .progress_callback(callback as Arc<dyn RunProgressCallback>)
        .build()
        .context("Invalid configuration")?;

    let wiki = build_wiki(&cli, config.request_timeout())?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = run_pipeline(&config, &wiki, &provider).await;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }

    Ok(())
}

/// Map the Confluence flags to a client; missing values fail here, before
/// any request is sent.
fn build_wiki(cli: &Cli, timeout: Duration) -> Result<Arc<dyn WikiSource>> {
    let deployment = if cli.server {
        Deployment::Server
    } else {
        Deployment::Cloud
    };
    let settings = ConfluenceSettings::new(
        cli.confluence_url.clone().unwrap_or_default(),
        cli.confluence_username.clone().unwrap_or_default(),
        cli.confluence_api_token.clone().unwrap_or_default(),
    )
    .with_deployment(deployment)
    .with_export_poll_interval(Duration::from_secs(cli.poll_interval.max(1)));

    let client =
        ConfluenceClient::new(settings, timeout).context("Invalid Confluence configuration")?;
    Ok(Arc::new(client))
}

/// Set every well-formed `.env` pair, replacing existing values.
fn apply_overriding<E>(pairs: impl Iterator<Item = Result<(String, String), E>>) {
    for (key, value) in pairs.flatten() {
        std::env::set_var(key, value);
    }
}
