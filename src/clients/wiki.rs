//! Wiki collaborator interface and the typed records it returns.

use crate::error::Strip2DescError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// A wiki page as returned by the child-page query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Opaque identifier; Confluence sends it as a string, some proxies as a number.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
}

impl Page {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Body of a CQL search (`GET /rest/api/search`).
///
/// `results` is optional on purpose: an answer without it is a shape
/// mismatch that discovery reports, not a deserialisation panic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Option<Vec<SearchResult>>,
    #[serde(default)]
    pub total_size: Option<usize>,
}

impl SearchResponse {
    /// Response listing the given pages, in order.
    pub fn from_pages(pages: impl IntoIterator<Item = Page>) -> Self {
        let results: Vec<SearchResult> = pages
            .into_iter()
            .map(|p| SearchResult { content: Some(p) })
            .collect();
        Self {
            total_size: Some(results.len()),
            results: Some(results),
        }
    }
}

/// One hit of a CQL search. Non-content hits (users, spaces) carry no `content`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub content: Option<Page>,
}

/// Source of child pages and their PDF exports.
#[async_trait]
pub trait WikiSource: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// List the direct children of `parent_id`, at most `limit` of them.
    async fn search_children(
        &self,
        parent_id: &str,
        limit: usize,
    ) -> Result<SearchResponse, Strip2DescError>;

    /// Export one page as PDF bytes.
    async fn export_pdf(&self, page_id: &str) -> Result<Vec<u8>, Strip2DescError>;
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_confluence_search_body() {
        let body = r#"{
            "results": [
                {"content": {"id": "101", "type": "page", "title": "[Hero Banner] Intro"},
                 "title": "[Hero Banner] Intro", "excerpt": ""},
                {"content": {"id": 102, "type": "page", "title": "Meeting Notes"}},
                {"user": {"accountId": "abc"}}
            ],
            "start": 0, "limit": 100, "size": 3, "totalSize": 3
        }"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let results = parsed.results.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].content,
            Some(Page::new("101", "[Hero Banner] Intro"))
        );
        assert_eq!(results[1].content.as_ref().unwrap().id, "102");
        assert!(results[2].content.is_none());
        assert_eq!(parsed.total_size, Some(3));
    }

    #[test]
    fn missing_results_key_is_none() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"statusCode": 200}"#).unwrap();
        assert!(parsed.results.is_none());
    }

    #[test]
    fn content_without_title_is_rejected() {
        let body = r#"{"results": [{"content": {"id": "1"}}]}"#;
        assert!(serde_json::from_str::<SearchResponse>(body).is_err());
    }
}
