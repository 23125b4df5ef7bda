//! Run entry points: the full discovery pipeline and direct mode.
//!
//! ## Page lifecycle
//!
//! ```text
//! discovered ──▶ classify ──┬─▶ Skipped(NotStripComponent)
//!                           └─▶ cache ──┬─▶ Failed(ExportFailed)
//!                                       └─▶ describe ──┬─▶ Failed(DescribeFailed)
//!                                                      └─▶ Described
//! ```
//!
//! Pages are processed strictly one after another. A failure ends that page
//! only; the loop always moves on to the next one, and nothing is retried.

use crate::clients::{DescriptionProvider, Page, WikiSource};
use crate::config::PipelineConfig;
use crate::error::{PageError, Strip2DescError};
use crate::output::{PageOutcome, PageReport, RunReport, SkipReason};
use crate::pipeline::cache::ExportCache;
use crate::pipeline::{describe, discover, input};
use crate::progress::RunProgressCallback;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Describe every strip-component child of `config.parent_page_id`.
///
/// Always returns a report. A failed or shapeless discovery yields an empty
/// report with [`RunReport::discovery_error`] set and makes no export or
/// model calls; per-page failures are recorded as [`PageOutcome::Failed`].
pub async fn run_pipeline(
    config: &PipelineConfig,
    wiki: &Arc<dyn WikiSource>,
    provider: &Arc<dyn DescriptionProvider>,
) -> RunReport {
    let total_start = Instant::now();
    let progress = config.progress_callback.as_deref();
    let parent = config.parent_page_id.as_str();

    // ── Step 1: Discover children ────────────────────────────────────────
    info!("Searching for child pages of {} via {}", parent, wiki.name());
    if let Some(cb) = progress {
        cb.on_discovery_start(parent);
    }

    let pages = match discover::discover_pages(wiki.as_ref(), parent, config.search_limit).await {
        Ok(pages) => pages,
        Err(e) => {
            let error = e.to_string();
            warn!("No child pages found: {}", error);
            if let Some(cb) = progress {
                cb.on_discovery_failed(&error);
            }
            let report = RunReport {
                discovery_error: Some(error),
                pages: Vec::new(),
                stats: RunReport::tally(&[], total_start.elapsed().as_millis() as u64),
            };
            if let Some(cb) = progress {
                cb.on_run_complete(&report.stats);
            }
            return report;
        }
    };

    info!("Found {} child pages", pages.len());
    if let Some(cb) = progress {
        cb.on_discovery_complete(pages.len());
    }

    // ── Step 2: Export and describe, one page at a time ─────────────────
    let cache = ExportCache::new(&config.cache_dir);
    debug!("Export cache directory: {}", cache.dir().display());
    let total = pages.len();
    let mut reports = Vec::with_capacity(total);

    for (i, page) in pages.into_iter().enumerate() {
        if let Some(cb) = progress {
            cb.on_page_start(i + 1, total, &page);
        }
        let page_start = Instant::now();
        let outcome = process_page(&cache, wiki.as_ref(), provider.as_ref(), &page, progress).await;

        reports.push(PageReport {
            component: discover::component_tag(&page.title).map(str::to_string),
            page,
            outcome,
            duration_ms: page_start.elapsed().as_millis() as u64,
        });
    }

    // ── Step 3: Summarise ────────────────────────────────────────────────
    let stats = RunReport::tally(&reports, total_start.elapsed().as_millis() as u64);
    info!(
        "Run complete: {} described, {} skipped, {} failed of {} ({}ms)",
        stats.described, stats.skipped, stats.failed, stats.found, stats.total_duration_ms
    );
    if let Some(cb) = progress {
        cb.on_run_complete(&stats);
    }

    RunReport {
        discovery_error: None,
        pages: reports,
        stats,
    }
}

/// Drive one child page to its terminal outcome.
async fn process_page(
    cache: &ExportCache,
    wiki: &dyn WikiSource,
    provider: &dyn DescriptionProvider,
    page: &Page,
    progress: Option<&dyn RunProgressCallback>,
) -> PageOutcome {
    if !discover::is_strip_component(&page.title) {
        info!("Page {} ({}) is not a strip component, skipping", page.id, page.title);
        let reason = SkipReason::NotStripComponent;
        if let Some(cb) = progress {
            cb.on_page_skipped(page, &reason);
        }
        return PageOutcome::Skipped(reason);
    }

    let cached = match cache.ensure(wiki, page, progress).await {
        Ok(cached) => cached,
        Err(e) => {
            warn!("{}", e);
            if let Some(cb) = progress {
                cb.on_page_error(page, &e.to_string());
            }
            return PageOutcome::Failed(e);
        }
    };

    match describe::describe_pdf(provider, &cached.path).await {
        Ok(description) => {
            if let Some(cb) = progress {
                cb.on_description(page, &description);
            }
            PageOutcome::Described {
                description,
                pdf_path: cached.path,
                cache: cached.status,
            }
        }
        Err(e) => {
            let err = PageError::DescribeFailed {
                page_id: page.id.clone(),
                detail: e.to_string(),
            };
            warn!("{}", err);
            if let Some(cb) = progress {
                cb.on_page_error(page, &e.to_string());
            }
            PageOutcome::Failed(err)
        }
    }
}

/// Direct mode: describe a single local PDF, bypassing the wiki.
///
/// # Errors
/// [`Strip2DescError::FileNotFound`] / [`Strip2DescError::NotAPdf`] before
/// any model call; otherwise whatever the provider reports.
pub async fn describe_file(
    path: impl AsRef<Path>,
    provider: &Arc<dyn DescriptionProvider>,
) -> Result<String, Strip2DescError> {
    let path = input::resolve_local(path)?;
    info!("Calling {} with specified PDF: {}", provider.name(), path.display());
    describe::describe_pdf(provider.as_ref(), &path).await
}
