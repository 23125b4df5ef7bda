//! Configuration types for a strip2desc run.
//!
//! Three structs cover the three parties involved:
//!
//! * [`ConfluenceSettings`]: where the wiki lives and how to authenticate.
//! * [`GeminiSettings`]: API key and model for the description generator.
//! * [`PipelineConfig`]: what to process and where to cache it, built via
//!   [`PipelineConfigBuilder`].
//!
//! All three are created once at process start and passed by reference into
//! the clients and the driver; nothing in the library reads the environment.

use crate::error::Strip2DescError;
use crate::progress::RunProgressCallback;
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Gemini REST base URL used by the Developer API.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Maximum number of child pages requested from the wiki.
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// Which Confluence flavour serves the PDF export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deployment {
    /// Atlassian Cloud: export runs as a background task that must be polled. (default)
    #[default]
    Cloud,
    /// Server / Data Center: the export action returns the PDF directly.
    Server,
}

/// Connection settings for the Confluence REST API.
#[derive(Clone)]
pub struct ConfluenceSettings {
    /// Site base URL including the context path, e.g. `https://acme.atlassian.net/wiki`.
    /// A bare `*.atlassian.net` site gets `/wiki` appended.
    pub base_url: String,
    pub username: String,
    /// API token (Cloud) or password (Server), sent via HTTP basic auth.
    pub api_token: String,
    pub deployment: Deployment,
    /// Delay between two polls of a Cloud export task. Default: 3 s.
    pub export_poll_interval: Duration,
    /// Polls before a Cloud export is abandoned. Default: 100.
    pub export_max_polls: u32,
}

impl ConfluenceSettings {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            username: username.into(),
            api_token: api_token.into(),
            deployment: Deployment::default(),
            export_poll_interval: Duration::from_millis(3000),
            export_max_polls: 100,
        }
    }

    pub fn with_deployment(mut self, deployment: Deployment) -> Self {
        self.deployment = deployment;
        self
    }

    pub fn with_export_poll_interval(mut self, interval: Duration) -> Self {
        self.export_poll_interval = interval;
        self
    }

    pub fn with_export_max_polls(mut self, polls: u32) -> Self {
        self.export_max_polls = polls.max(1);
        self
    }

    /// Check that every field needed to talk to the wiki is present.
    pub fn validate(&self) -> Result<(), Strip2DescError> {
        if self.base_url.is_empty() {
            return Err(Strip2DescError::MissingSetting {
                name: "Confluence URL",
                env: "CONFLUENCE_URL",
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Strip2DescError::InvalidConfig(format!(
                "Confluence URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.username.is_empty() {
            return Err(Strip2DescError::MissingSetting {
                name: "Confluence username",
                env: "CONFLUENCE_USERNAME",
            });
        }
        if self.api_token.is_empty() {
            return Err(Strip2DescError::MissingSetting {
                name: "Confluence API token",
                env: "CONFLUENCE_API_TOKEN",
            });
        }
        Ok(())
    }
}

/// Trim whitespace and trailing slashes; Cloud sites serve the REST API
/// under `/wiki`, so add it when a `*.atlassian.net` URL lacks it.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let Ok(url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };
    let cloud = url
        .host_str()
        .is_some_and(|host| host.ends_with(".atlassian.net"));
    let path = url.path();
    if cloud && path != "/wiki" && !path.starts_with("/wiki/") {
        format!("{trimmed}/wiki")
    } else {
        trimmed.to_string()
    }
}

impl fmt::Debug for ConfluenceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfluenceSettings")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("export_poll_interval", &self.export_poll_interval)
            .field("export_max_polls", &self.export_max_polls)
            .finish()
    }
}

/// Settings for the Gemini `generateContent` API.
#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    /// Model identifier without the `models/` prefix. Default: `gemini-2.5-flash`.
    pub model: String,
    /// Override for sandboxes or proxies. Default: [`GEMINI_API_BASE_URL`].
    pub base_url: String,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model = model
            .strip_prefix("models/")
            .map(str::to_string)
            .unwrap_or(model);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn validate(&self) -> Result<(), Strip2DescError> {
        if self.api_key.is_empty() {
            return Err(Strip2DescError::MissingSetting {
                name: "Gemini API key",
                env: "GEMINI_API_KEY",
            });
        }
        if self.model.is_empty() {
            return Err(Strip2DescError::InvalidConfig("model must not be empty".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for one discovery-export-describe run.
///
/// Built via [`PipelineConfig::builder()`].
///
/// # Example
/// ```rust
/// use strip2desc::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .parent_page_id("123456")
///     .cache_dir("exports")
///     .search_limit(50)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Page whose direct children are processed.
    pub parent_page_id: String,

    /// Directory holding `<sanitized title>.pdf` files. Default: `.`.
    pub cache_dir: PathBuf,

    /// Result ceiling of the single child-page query. Range 1–1000. Default: 100.
    ///
    /// Children beyond the ceiling are not processed; a warning is logged
    /// when the wiki reports more results than were returned.
    pub search_limit: usize,

    /// Timeout applied to every HTTP request, in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Optional per-page event sink.
    pub progress_callback: Option<Arc<dyn RunProgressCallback>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parent_page_id: String::new(),
            cache_dir: PathBuf::from("."),
            search_limit: DEFAULT_SEARCH_LIMIT,
            request_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("parent_page_id", &self.parent_page_id)
            .field("cache_dir", &self.cache_dir)
            .field("search_limit", &self.search_limit)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn parent_page_id(mut self, id: impl Into<String>) -> Self {
        self.config.parent_page_id = id.into().trim().to_string();
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    pub fn search_limit(mut self, limit: usize) -> Self {
        self.config.search_limit = limit.clamp(1, 1000);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn RunProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Strip2DescError> {
        let c = &self.config;
        if c.parent_page_id.is_empty() {
            return Err(Strip2DescError::MissingSetting {
                name: "parent page id",
                env: "CONFLUENCE_PAGE_ID",
            });
        }
        if c.cache_dir.as_os_str().is_empty() {
            return Err(Strip2DescError::InvalidConfig(
                "cache directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_parent_page() {
        let err = PipelineConfig::builder().build().unwrap_err();
        assert!(matches!(
            err,
            Strip2DescError::MissingSetting {
                env: "CONFLUENCE_PAGE_ID",
                ..
            }
        ));
    }

    #[test]
    fn builder_defaults() {
        let config = PipelineConfig::builder()
            .parent_page_id(" 42 ")
            .build()
            .unwrap();
        assert_eq!(config.parent_page_id, "42");
        assert_eq!(config.search_limit, 100);
        assert_eq!(config.cache_dir, PathBuf::from("."));
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn search_limit_is_clamped() {
        let config = PipelineConfig::builder()
            .parent_page_id("1")
            .search_limit(0)
            .build()
            .unwrap();
        assert_eq!(config.search_limit, 1);
    }

    #[test]
    fn confluence_settings_trim_trailing_slash() {
        let s = ConfluenceSettings::new("https://acme.atlassian.net/wiki/", "me", "tok");
        assert_eq!(s.base_url, "https://acme.atlassian.net/wiki");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn confluence_settings_add_wiki_to_cloud_sites() {
        let s = ConfluenceSettings::new("https://acme.atlassian.net", "me", "tok");
        assert_eq!(s.base_url, "https://acme.atlassian.net/wiki");

        let s = ConfluenceSettings::new("https://acme.atlassian.net/", "me", "tok");
        assert_eq!(s.base_url, "https://acme.atlassian.net/wiki");
    }

    #[test]
    fn confluence_settings_keep_other_urls() {
        let s = ConfluenceSettings::new("https://acme.atlassian.net/wiki", "me", "tok");
        assert_eq!(s.base_url, "https://acme.atlassian.net/wiki");

        let s = ConfluenceSettings::new("https://wiki.acme.com/confluence/", "me", "tok");
        assert_eq!(s.base_url, "https://wiki.acme.com/confluence");

        let s = ConfluenceSettings::new("https://wiki.acme.com", "me", "tok");
        assert_eq!(s.base_url, "https://wiki.acme.com");

        // Unparseable values pass through for validate() to reject.
        let s = ConfluenceSettings::new("acme.atlassian.net", "me", "tok");
        assert_eq!(s.base_url, "acme.atlassian.net");
        assert!(s.validate().is_err());
    }

    #[test]
    fn confluence_settings_reject_missing_token() {
        let s = ConfluenceSettings::new("https://acme.atlassian.net/wiki", "me", "");
        assert!(matches!(
            s.validate(),
            Err(Strip2DescError::MissingSetting {
                env: "CONFLUENCE_API_TOKEN",
                ..
            })
        ));
    }

    #[test]
    fn confluence_settings_reject_bare_host() {
        let s = ConfluenceSettings::new("acme.atlassian.net", "me", "tok");
        assert!(matches!(s.validate(), Err(Strip2DescError::InvalidConfig(_))));
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let c = ConfluenceSettings::new("https://x", "me", "super-secret");
        let g = GeminiSettings::new("AIza-secret");
        assert!(!format!("{c:?}").contains("super-secret"));
        assert!(!format!("{g:?}").contains("AIza-secret"));
    }

    #[test]
    fn gemini_model_prefix_is_stripped() {
        let g = GeminiSettings::new("k").with_model("models/gemini-2.5-pro");
        assert_eq!(g.model, "gemini-2.5-pro");
        assert_eq!(GeminiSettings::new("k").model, DEFAULT_MODEL);
    }

    #[test]
    fn gemini_requires_key() {
        assert!(matches!(
            GeminiSettings::new("").validate(),
            Err(Strip2DescError::MissingSetting {
                env: "GEMINI_API_KEY",
                ..
            })
        ));
    }
}
