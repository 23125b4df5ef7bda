//! Confluence REST client: CQL child-page search and PDF export.
//!
//! ## PDF export on Cloud
//!
//! Confluence Cloud does not answer the export action with the PDF. It starts
//! a background task and returns an HTML page carrying the task id in an
//! `ajs-taskId` meta tag. The client then:
//!
//! 1. polls `/services/api/v1/task/<id>/progress` until `progress` is 100
//!    (a `FAILED` state aborts),
//! 2. fetches the task `result` path, whose body is a pre-signed download URL,
//! 3. downloads the PDF from that URL without credentials.
//!
//! Server / Data Center returns the PDF from the export action directly.

use crate::clients::wiki::{SearchResponse, WikiSource};
use crate::config::{ConfluenceSettings, Deployment};
use crate::error::Strip2DescError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::{debug, info, warn};

const SERVICE: &str = "confluence";

static RE_TASK_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="ajs-taskId"\s+content="([^"]+)""#).unwrap());

/// [`WikiSource`] backed by the Confluence REST API.
#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    http: reqwest::Client,
    settings: ConfluenceSettings,
}

impl ConfluenceClient {
    /// Validate `settings` and build a client whose requests time out after `timeout`.
    pub fn new(settings: ConfluenceSettings, timeout: Duration) -> Result<Self, Strip2DescError> {
        settings.validate()?;
        Ok(Self {
            http: super::http_client(timeout)?,
            settings,
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url,
            path.trim_start_matches('/')
        )
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.settings.username, Some(&self.settings.api_token))
    }

    /// GET with credentials, mapping auth failures and non-2xx statuses.
    async fn get_authed(
        &self,
        url: &str,
        page_id: &str,
        form_token: bool,
    ) -> Result<reqwest::Response, Strip2DescError> {
        let mut builder = self.authed(self.http.get(url));
        if form_token {
            builder = builder.header("X-Atlassian-Token", "no-check");
        }
        let response = builder
            .send()
            .await
            .map_err(|e| Strip2DescError::http(url, e))?;
        check_status(response, page_id).await
    }

    async fn export_cloud(&self, page_id: &str) -> Result<Vec<u8>, Strip2DescError> {
        let action = self.url(&format!(
            "spaces/flyingpdf/pdfpageexport.action?pageId={page_id}"
        ));
        let html = self
            .get_authed(&action, page_id, true)
            .await?
            .text()
            .await
            .map_err(|e| Strip2DescError::http(&action, e))?;

        let task_id = extract_task_id(&html).ok_or_else(|| Strip2DescError::ExportFailed {
            page_id: page_id.to_string(),
            reason: "export page did not contain a task id".into(),
        })?;
        debug!("Page {}: export task {}", page_id, task_id);

        let result_path = self.wait_for_task(page_id, &task_id).await?;

        let result_url = self.resolve(&result_path)?;
        let download_url = self
            .get_authed(&result_url, page_id, false)
            .await?
            .text()
            .await
            .map_err(|e| Strip2DescError::http(&result_url, e))?;
        let download_url = self.resolve(download_url.trim())?;

        // The download link is pre-signed; credentials must not be attached.
        let response = self
            .http
            .get(&download_url)
            .send()
            .await
            .map_err(|e| Strip2DescError::http(&download_url, e))?;
        let bytes = check_status(response, page_id)
            .await?
            .bytes()
            .await
            .map_err(|e| Strip2DescError::http(&download_url, e))?;
        Ok(bytes.to_vec())
    }

    async fn wait_for_task(&self, page_id: &str, task_id: &str) -> Result<String, Strip2DescError> {
        let poll_url = self.url(&format!("services/api/v1/task/{task_id}/progress"));

        for poll in 1..=self.settings.export_max_polls {
            let body = self
                .get_authed(&poll_url, page_id, false)
                .await?
                .text()
                .await
                .map_err(|e| Strip2DescError::http(&poll_url, e))?;
            let progress: TaskProgress =
                serde_json::from_str(&body).map_err(|e| Strip2DescError::ExportFailed {
                    page_id: page_id.to_string(),
                    reason: format!("unreadable task progress: {e}"),
                })?;

            match progress.outcome() {
                TaskOutcome::Failed => {
                    return Err(Strip2DescError::ExportFailed {
                        page_id: page_id.to_string(),
                        reason: "PDF conversion task reported FAILED".into(),
                    });
                }
                TaskOutcome::Done(Some(result)) => {
                    info!("Page {}: export task complete after {} polls", page_id, poll);
                    return Ok(result);
                }
                TaskOutcome::Done(None) => {
                    return Err(Strip2DescError::ExportFailed {
                        page_id: page_id.to_string(),
                        reason: "export task finished without a result link".into(),
                    });
                }
                TaskOutcome::Running(pct) => {
                    debug!(
                        "Page {}: export {}% ({})",
                        page_id,
                        pct,
                        progress.state.as_deref().unwrap_or("-")
                    );
                    tokio::time::sleep(self.settings.export_poll_interval).await;
                }
            }
        }

        warn!(
            "Page {}: export task {} did not finish in {} polls",
            page_id, task_id, self.settings.export_max_polls
        );
        Err(Strip2DescError::ExportTimedOut {
            page_id: page_id.to_string(),
            polls: self.settings.export_max_polls,
        })
    }

    /// Turn a site-relative path (`/wiki/download/...`) or absolute URL into an absolute URL.
    fn resolve(&self, link: &str) -> Result<String, Strip2DescError> {
        let base = Url::parse(&self.settings.base_url)
            .map_err(|e| Strip2DescError::InvalidConfig(format!("Confluence URL: {e}")))?;
        base.join(link)
            .map(String::from)
            .map_err(|e| Strip2DescError::Internal(format!("bad link '{link}': {e}")))
    }
}

#[async_trait]
impl WikiSource for ConfluenceClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn search_children(
        &self,
        parent_id: &str,
        limit: usize,
    ) -> Result<SearchResponse, Strip2DescError> {
        let url = self.url("rest/api/search");
        let cql = format!("parent = {parent_id}");
        let limit = limit.to_string();
        debug!("CQL query: {} (limit {})", cql, limit);

        let response = self
            .authed(self.http.get(&url))
            .query(&[("cql", cql.as_str()), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| Strip2DescError::http(&url, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Strip2DescError::AuthError {
                service: SERVICE.into(),
                detail: format!("HTTP {status}"),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|e| Strip2DescError::http(&url, e))?;
        if !status.is_success() {
            return Err(Strip2DescError::DiscoveryFailed {
                parent: parent_id.to_string(),
                reason: format!("HTTP {status}: {}", truncate(&body, 200)),
            });
        }

        serde_json::from_str(&body).map_err(|e| Strip2DescError::DiscoveryFailed {
            parent: parent_id.to_string(),
            reason: format!("malformed search response: {e}"),
        })
    }

    async fn export_pdf(&self, page_id: &str) -> Result<Vec<u8>, Strip2DescError> {
        let bytes = match self.settings.deployment {
            Deployment::Cloud => self.export_cloud(page_id).await?,
            Deployment::Server => {
                let url = self.url(&format!(
                    "spaces/flyingpdf/pdfpageexport.action?pageId={page_id}"
                ));
                self.get_authed(&url, page_id, true)
                    .await?
                    .bytes()
                    .await
                    .map_err(|e| Strip2DescError::http(&url, e))?
                    .to_vec()
            }
        };

        if !bytes.starts_with(b"%PDF") {
            return Err(Strip2DescError::ExportFailed {
                page_id: page_id.to_string(),
                reason: format!("response is not a PDF ({} bytes)", bytes.len()),
            });
        }
        Ok(bytes)
    }
}

async fn check_status(
    response: reqwest::Response,
    page_id: &str,
) -> Result<reqwest::Response, Strip2DescError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Strip2DescError::AuthError {
            service: SERVICE.into(),
            detail: format!("HTTP {status}"),
        });
    }
    let body = response.text().await.unwrap_or_default();
    Err(Strip2DescError::ExportFailed {
        page_id: page_id.to_string(),
        reason: format!("HTTP {status}: {}", truncate(&body, 200)),
    })
}

/// Pull the export task id out of the HTML returned by the export action.
pub(crate) fn extract_task_id(html: &str) -> Option<String> {
    RE_TASK_ID.captures(html).map(|caps| caps[1].to_string())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Body of `/services/api/v1/task/<id>/progress`.
#[derive(Debug, Deserialize)]
struct TaskProgress {
    #[serde(default, deserialize_with = "percent")]
    progress: u32,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    result: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum TaskOutcome {
    Running(u32),
    Done(Option<String>),
    Failed,
}

impl TaskProgress {
    fn outcome(&self) -> TaskOutcome {
        if self.state.as_deref() == Some("FAILED") {
            TaskOutcome::Failed
        } else if self.progress >= 100 {
            TaskOutcome::Done(self.result.clone())
        } else {
            TaskOutcome::Running(self.progress)
        }
    }
}

fn percent<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pct {
        Number(u32),
        Text(String),
    }

    match Pct::deserialize(deserializer)? {
        Pct::Number(n) => Ok(n),
        Pct::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
