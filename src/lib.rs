//! # strip2desc
//!
//! Describe Confluence "strip component" pages with a generative model.
//!
//! ## Why this crate?
//!
//! Component documentation lives in Confluence as one child page per strip
//! component, written for developers. Marketing needs a short, jargon-free
//! blurb for each one. This crate walks the children of a parent page,
//! exports each component page as PDF (once, cached on disk by title), and
//! asks Gemini to read the PDF and write an 80-word description.
//!
//! ## Pipeline Overview
//!
//! ```text
//! parent page
//!  │
//!  ├─ 1. Discover  CQL `parent = <id>`, keep titles containing `[`
//!  ├─ 2. Cache     `<sanitized title>.pdf` present? reuse : export + write
//!  ├─ 3. Describe  PDF + fixed prompt → Gemini generateContent
//!  └─ 4. Report    one PageOutcome per child, failures isolated per page
//! ```
//!
//! Direct mode skips steps 1–2: [`describe_file`] sends one local PDF.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use strip2desc::{
//!     run_pipeline, ConfluenceClient, ConfluenceSettings, DescriptionProvider, GeminiClient,
//!     GeminiSettings, PipelineConfig, WikiSource,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder().parent_page_id("123456").build()?;
//!     let timeout = Duration::from_secs(config.request_timeout_secs);
//!
//!     let wiki: Arc<dyn WikiSource> = Arc::new(ConfluenceClient::new(
//!         ConfluenceSettings::new("https://acme.atlassian.net/wiki", "me@acme.com", "api-token"),
//!         timeout,
//!     )?);
//!     let model: Arc<dyn DescriptionProvider> =
//!         Arc::new(GeminiClient::new(GeminiSettings::new("AIza..."), timeout)?);
//!
//!     let report = run_pipeline(&config, &wiki, &model).await;
//!     for (title, text) in report.descriptions() {
//!         println!("# {title}\n{text}\n");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `strip2desc` binary (clap + anyhow + tracing-subscriber + dotenv) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod clients;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use clients::{
    ConfluenceClient, DescriptionProvider, GeminiClient, Page, SearchResponse, SearchResult,
    WikiSource,
};
pub use config::{
    ConfluenceSettings, Deployment, GeminiSettings, PipelineConfig, PipelineConfigBuilder,
};
pub use error::{PageError, Strip2DescError};
pub use output::{
    description_block, CacheStatus, PageOutcome, PageReport, RunReport, RunStats, SkipReason,
};
pub use pipeline::cache::{CachedPdf, ExportCache};
pub use pipeline::discover::{component_tag, discover_pages, is_strip_component};
pub use pipeline::sanitize::{cache_file_name, sanitize_filename};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use run::{describe_file, run_pipeline};
