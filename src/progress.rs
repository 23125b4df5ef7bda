//! Progress-callback trait for per-page pipeline events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the driver walks the child pages. The CLI uses it to print the
//! status lines and descriptions; library users can forward the events to a
//! log, a channel or a UI.
//!
//! # Example
//!
//! ```rust
//! use strip2desc::{Page, PipelineConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     described: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_description(&self, page: &Page, description: &str) {
//!         self.described.fetch_add(1, Ordering::SeqCst);
//!         println!("# {}\n{}", page.title, description);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { described: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .parent_page_id("123456")
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::clients::Page;
use crate::output::{RunStats, SkipReason};
use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline driver as it processes each child page.
///
/// The driver is sequential, so events for one page always arrive in order
/// (`on_page_start` → cache/export events → `on_description` or
/// `on_page_error`) before the next page starts. All methods default to
/// no-ops so implementations only override what they need.
pub trait RunProgressCallback: Send + Sync {
    /// Called right before the child-page query is sent.
    fn on_discovery_start(&self, parent_id: &str) {
        let _ = parent_id;
    }

    /// Called once discovery returned `found` child pages.
    fn on_discovery_complete(&self, found: usize) {
        let _ = found;
    }

    /// Called instead of [`on_discovery_complete`](Self::on_discovery_complete)
    /// when the query failed or returned no result list. No page events follow.
    fn on_discovery_failed(&self, error: &str) {
        let _ = error;
    }

    /// Called before a child page is classified.
    ///
    /// # Arguments
    /// * `index`: 1-based position in discovery order
    /// * `total`: number of children found
    fn on_page_start(&self, index: usize, total: usize, page: &Page) {
        let _ = (index, total, page);
    }

    /// Called when a child page is not processed further.
    fn on_page_skipped(&self, page: &Page, reason: &SkipReason) {
        let _ = (page, reason);
    }

    /// Called when the PDF is already present in the cache directory.
    fn on_cache_hit(&self, page: &Page, path: &Path) {
        let _ = (page, path);
    }

    /// Called before the export request is sent.
    fn on_export_start(&self, page: &Page, path: &Path) {
        let _ = (page, path);
    }

    /// Called after the exported PDF has been written to `path`.
    fn on_export_complete(&self, page: &Page, path: &Path, bytes: usize) {
        let _ = (page, path, bytes);
    }

    /// Called when exporting or describing a page failed.
    fn on_page_error(&self, page: &Page, error: &str) {
        let _ = (page, error);
    }

    /// Called with the generated description of a page.
    fn on_description(&self, page: &Page, description: &str) {
        let _ = (page, description);
    }

    /// Called once after the last page.
    fn on_run_complete(&self, stats: &RunStats) {
        let _ = stats;
    }
}

/// No-op implementation of [`RunProgressCallback`].
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience type alias for a shared progress callback.
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
