//! Page discovery: list the parent's children and classify strip components.
//!
//! One CQL query (`parent = <id>`) capped at the configured limit; no
//! pagination. The collaborator's order is kept as-is.

use crate::clients::{Page, WikiSource};
use crate::error::Strip2DescError;
use tracing::{debug, warn};

/// Fetch the direct children of `parent_id`.
///
/// # Errors
/// [`Strip2DescError::DiscoveryFailed`] when the response has no `results`
/// list; transport and auth errors from the wiki are passed through.
pub async fn discover_pages(
    wiki: &dyn WikiSource,
    parent_id: &str,
    limit: usize,
) -> Result<Vec<Page>, Strip2DescError> {
    let response = wiki.search_children(parent_id, limit).await?;

    let results = response
        .results
        .ok_or_else(|| Strip2DescError::DiscoveryFailed {
            parent: parent_id.to_string(),
            reason: "response has no 'results' field".into(),
        })?;

    let returned = results.len();
    let pages: Vec<Page> = results.into_iter().filter_map(|r| r.content).collect();
    if pages.len() < returned {
        warn!(
            "{} of {} search results carried no page content and were dropped",
            returned - pages.len(),
            returned
        );
    }

    if let Some(total) = response.total_size {
        if total > returned {
            warn!(
                "Parent {} has {} children but only {} were returned (limit {}); the rest are not processed",
                parent_id, total, returned, limit
            );
        }
    }

    debug!("Discovered {} child pages of {}", pages.len(), parent_id);
    Ok(pages)
}

/// A page is a strip component iff its title contains `[`.
pub fn is_strip_component(title: &str) -> bool {
    title.contains('[')
}

/// Text between the first `[` and the following `]`, trimmed.
///
/// `"[Hero Banner] Intro"` → `Some("Hero Banner")`. Returns `None` for titles
/// without a closed, non-empty tag.
pub fn component_tag(title: &str) -> Option<&str> {
    let start = title.find('[')? + 1;
    let len = title[start..].find(']')?;
    let tag = title[start..start + len].trim();
    (!tag.is_empty()).then_some(tag)
}
