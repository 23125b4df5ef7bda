//! Result types produced by a pipeline run.
//!
//! Every child page ends in exactly one [`PageOutcome`]; the driver never
//! stops early, so a [`RunReport`] always lists every page discovery returned.

use crate::clients::Page;
use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why a page was not exported or described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The title carries no bracketed component tag.
    NotStripComponent,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotStripComponent => f.write_str("Non-strip component page"),
        }
    }
}

/// How the PDF for a page was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStatus {
    /// A file with the expected name already existed; no export call was made.
    Hit,
    /// The page was exported and `bytes` were written.
    Exported { bytes: usize },
}

/// Terminal state of one child page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PageOutcome {
    Described {
        description: String,
        pdf_path: PathBuf,
        cache: CacheStatus,
    },
    Skipped(SkipReason),
    Failed(PageError),
}

/// One child page and what happened to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub page: Page,
    /// Text inside the first `[...]` of the title, if any.
    pub component: Option<String>,
    pub outcome: PageOutcome,
    pub duration_ms: u64,
}

impl PageReport {
    pub fn description(&self) -> Option<&str> {
        match &self.outcome {
            PageOutcome::Described { description, .. } => Some(description),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PageError> {
        match &self.outcome {
            PageOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Child pages returned by discovery.
    pub found: usize,
    pub described: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Pages whose PDF was downloaded during this run.
    pub exported: usize,
    /// Pages whose PDF was already on disk.
    pub cache_hits: usize,
    pub total_duration_ms: u64,
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Set when the child-page query failed or returned no result list.
    pub discovery_error: Option<String>,
    /// One entry per child page, in discovery order.
    pub pages: Vec<PageReport>,
    pub stats: RunStats,
}

impl RunReport {
    /// `true` when discovery yielded nothing to process.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Iterate over `(title, description)` of every described page.
    pub fn descriptions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pages
            .iter()
            .filter_map(|p| p.description().map(|d| (p.page.title.as_str(), d)))
    }

    pub(crate) fn tally(pages: &[PageReport], total_duration_ms: u64) -> RunStats {
        let mut stats = RunStats {
            found: pages.len(),
            total_duration_ms,
            ..RunStats::default()
        };
        for p in pages {
            match &p.outcome {
                PageOutcome::Described { cache, .. } => {
                    stats.described += 1;
                    match cache {
                        CacheStatus::Hit => stats.cache_hits += 1,
                        CacheStatus::Exported { .. } => stats.exported += 1,
                    }
                }
                PageOutcome::Skipped(_) => stats.skipped += 1,
                PageOutcome::Failed(_) => stats.failed += 1,
            }
        }
        stats
    }
}

/// Console form of one description: the page title as a `#` heading, the
/// text on the following lines.
pub fn description_block(title: &str, description: &str) -> String {
    format!("# {title}\n{description}\n")
}
