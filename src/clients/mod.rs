//! Remote collaborators: the wiki that owns the pages and the model that
//! describes them.
//!
//! The pipeline only ever talks to the two traits, [`WikiSource`] and
//! [`DescriptionProvider`], held as `Arc<dyn …>`. The production
//! implementations ([`ConfluenceClient`], [`GeminiClient`]) are thin reqwest
//! wrappers; tests swap in stubs that count calls.
//!
//! ```text
//! run ──▶ WikiSource ────────────▶ Confluence REST (search, PDF export)
//!   └───▶ DescriptionProvider ───▶ Gemini generateContent
//! ```

pub mod confluence;
pub mod gemini;
pub mod provider;
pub mod wiki;

pub use confluence::ConfluenceClient;
pub use gemini::GeminiClient;
pub use provider::DescriptionProvider;
pub use wiki::{Page, SearchResponse, SearchResult, WikiSource};

use crate::error::Strip2DescError;
use std::time::Duration;

/// Build the shared reqwest client with a bounded per-request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, Strip2DescError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("strip2desc/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Strip2DescError::Internal(format!("failed to build HTTP client: {e}")))
}
