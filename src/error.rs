//! Error types for the strip2desc library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Strip2DescError`]: returned by individual operations (configuration,
//!   discovery, a single export, a single generation call). Startup problems
//!   such as a missing setting are fatal for the process; everything else is
//!   caught by the pipeline driver at the page boundary.
//!
//! * [`PageError`]: **Non-fatal**: one page could not be exported or
//!   described, but every other page is unaffected. Stored inside
//!   [`crate::output::PageOutcome::Failed`] so callers see partial success
//!   instead of losing the whole run to one bad page.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by strip2desc operations.
///
/// Page-level failures inside a pipeline run are converted into
/// [`PageError`] and stored in the run report rather than propagated.
#[derive(Debug, Error)]
pub enum Strip2DescError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// A required setting was not supplied.
    #[error("Missing required setting '{name}'.\nSet {env} in the environment or in a .env file.")]
    MissingSetting {
        name: &'static str,
        env: &'static str,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// PDF file was not found at the given path.
    #[error("Provided PDF file does not exist: {path}")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Wiki errors ───────────────────────────────────────────────────────
    /// The child-page query failed or returned an unexpected shape.
    #[error("Child page discovery under '{parent}' failed: {reason}")]
    DiscoveryFailed { parent: String, reason: String },

    /// The wiki could not export a page as PDF.
    #[error("Export of page {page_id} failed: {reason}")]
    ExportFailed { page_id: String, reason: String },

    /// The export task did not finish within the configured number of polls.
    #[error("Export of page {page_id} still running after {polls} polls")]
    ExportTimedOut { page_id: String, polls: u32 },

    // ── Remote API errors ─────────────────────────────────────────────────
    /// Credentials were rejected (HTTP 401/403); retrying will not help.
    #[error("Authentication error from {service}: {detail}")]
    AuthError { service: String, detail: String },

    /// The generative-AI API returned HTTP 429.
    #[error("Rate limit exceeded for {service}: {detail}")]
    RateLimited { service: String, detail: String },

    /// The model refused to answer for content-policy reasons.
    #[error("Generation blocked by content policy: {reason}")]
    ContentBlocked { reason: String },

    /// The model call failed or produced no text.
    #[error("Generation with {provider} failed: {detail}")]
    GenerationFailed { provider: String, detail: String },

    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write an exported PDF into the cache directory.
    #[error("Failed to write cache file '{path}': {source}")]
    CacheWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read a PDF from disk.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Strip2DescError {
    /// Wrap a reqwest transport error together with the URL it was sent to.
    ///
    /// Query strings are dropped so credentials passed as parameters never
    /// reach log output.
    pub(crate) fn http(url: &str, source: reqwest::Error) -> Self {
        let url = url.split('?').next().unwrap_or(url).to_string();
        Strip2DescError::Http { url, source }
    }
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The PDF could not be exported or written to the cache.
    #[error("Page {page_id}: export failed: {detail}")]
    ExportFailed { page_id: String, detail: String },

    /// The cached PDF could not be described.
    #[error("Page {page_id}: description failed: {detail}")]
    DescribeFailed { page_id: String, detail: String },
}

impl PageError {
    /// Identifier of the page this error belongs to.
    pub fn page_id(&self) -> &str {
        match self {
            PageError::ExportFailed { page_id, .. } | PageError::DescribeFailed { page_id, .. } => {
                page_id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_setting_names_env_var() {
        let e = Strip2DescError::MissingSetting {
            name: "parent page id",
            env: "CONFLUENCE_PAGE_ID",
        };
        let msg = e.to_string();
        assert!(msg.contains("parent page id"), "got: {msg}");
        assert!(msg.contains("CONFLUENCE_PAGE_ID"), "got: {msg}");
    }

    #[test]
    fn file_not_found_display() {
        let e = Strip2DescError::FileNotFound {
            path: PathBuf::from("missing.pdf"),
        };
        assert_eq!(
            e.to_string(),
            "Provided PDF file does not exist: missing.pdf"
        );
    }

    #[test]
    fn export_timed_out_display() {
        let e = Strip2DescError::ExportTimedOut {
            page_id: "4242".into(),
            polls: 100,
        };
        assert!(e.to_string().contains("4242"));
        assert!(e.to_string().contains("100 polls"));
    }

    #[test]
    fn auth_error_display() {
        let e = Strip2DescError::AuthError {
            service: "gemini".into(),
            detail: "API key not valid".into(),
        };
        assert!(e.to_string().contains("gemini"));
        assert!(e.to_string().contains("API key not valid"));
    }

    #[test]
    fn page_error_exposes_page_id() {
        let e = PageError::DescribeFailed {
            page_id: "77".into(),
            detail: "boom".into(),
        };
        assert_eq!(e.page_id(), "77");
        assert!(e.to_string().contains("description failed"));
    }
}
