//! Export cache: make sure a page's PDF exists on disk, exporting it once.
//!
//! Presence is the only policy. A file with the expected name is trusted
//! forever: no size, hash or age check, and no network call. On a miss the
//! bytes are written to `<name>.pdf.tmp` and renamed into place, so a crash
//! mid-write never leaves a truncated file under the final name that later
//! runs would treat as valid.

use crate::clients::{Page, WikiSource};
use crate::error::{PageError, Strip2DescError};
use crate::output::CacheStatus;
use crate::pipeline::sanitize::cache_file_name;
use crate::progress::RunProgressCallback;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A PDF that is now present in the cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPdf {
    pub path: PathBuf,
    pub status: CacheStatus,
}

/// Directory of exported PDFs keyed by sanitized title.
#[derive(Debug, Clone)]
pub struct ExportCache {
    dir: PathBuf,
}

impl ExportCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the PDF for `page` is stored under.
    pub fn path_for(&self, page: &Page) -> PathBuf {
        self.dir.join(cache_file_name(page))
    }

    /// Ensure the PDF for `page` is on disk, exporting it on a miss.
    ///
    /// Never touches an existing file. Any export or write failure is
    /// returned as [`PageError::ExportFailed`] for this page only.
    pub async fn ensure(
        &self,
        wiki: &dyn WikiSource,
        page: &Page,
        progress: Option<&dyn RunProgressCallback>,
    ) -> Result<CachedPdf, PageError> {
        let path = self.path_for(page);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!("Cache hit for page {}: {}", page.id, path.display());
            if let Some(cb) = progress {
                cb.on_cache_hit(page, &path);
            }
            return Ok(CachedPdf {
                path,
                status: CacheStatus::Hit,
            });
        }

        if let Some(cb) = progress {
            cb.on_export_start(page, &path);
        }
        info!("Exporting page {} to {}", page.id, path.display());

        let result = async {
            let bytes = wiki.export_pdf(&page.id).await?;
            write_atomic(&path, &bytes).await?;
            Ok::<usize, Strip2DescError>(bytes.len())
        }
        .await;

        match result {
            Ok(bytes) => {
                if let Some(cb) = progress {
                    cb.on_export_complete(page, &path, bytes);
                }
                Ok(CachedPdf {
                    path,
                    status: CacheStatus::Exported { bytes },
                })
            }
            Err(e) => Err(PageError::ExportFailed {
                page_id: page.id.clone(),
                detail: e.to_string(),
            }),
        }
    }
}

/// Write to a sibling temp file, then rename onto `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Strip2DescError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Strip2DescError::CacheWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| Strip2DescError::CacheWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(Strip2DescError::CacheWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::SearchResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingWiki {
        exports: AtomicUsize,
        fail: bool,
    }

    impl CountingWiki {
        fn new(fail: bool) -> Self {
            Self {
                exports: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl WikiSource for CountingWiki {
        fn name(&self) -> &str {
            "counting"
        }

        async fn search_children(
            &self,
            _parent_id: &str,
            _limit: usize,
        ) -> Result<SearchResponse, Strip2DescError> {
            Ok(SearchResponse::default())
        }

        async fn export_pdf(&self, page_id: &str) -> Result<Vec<u8>, Strip2DescError> {
            self.exports.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Strip2DescError::ExportFailed {
                    page_id: page_id.into(),
                    reason: "HTTP 500".into(),
                });
            }
            Ok(format!("%PDF-1.7 page {page_id}").into_bytes())
        }
    }

    #[test]
    fn miss_exports_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExportCache::new(dir.path());
        let wiki = CountingWiki::new(false);
        let page = Page::new("5", "[CTA] Button");

        let cached = tokio_test::block_on(cache.ensure(&wiki, &page, None)).unwrap();

        assert_eq!(cached.path, dir.path().join("[CTA] Button.pdf"));
        assert_eq!(cached.status, CacheStatus::Exported { bytes: 15 });
        assert_eq!(std::fs::read(&cached.path).unwrap(), b"%PDF-1.7 page 5");
        assert!(!dir.path().join("[CTA] Button.pdf.tmp").exists());
        assert_eq!(wiki.exports.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hit_skips_export_and_keeps_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExportCache::new(dir.path());
        let wiki = CountingWiki::new(false);
        let page = Page::new("5", "[CTA] Button");
        std::fs::write(dir.path().join("[CTA] Button.pdf"), b"old bytes").unwrap();

        let cached = tokio_test::block_on(cache.ensure(&wiki, &page, None)).unwrap();

        assert_eq!(cached.status, CacheStatus::Hit);
        assert_eq!(wiki.exports.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&cached.path).unwrap(), b"old bytes");
    }

    #[test]
    fn failed_export_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExportCache::new(dir.path());
        let wiki = CountingWiki::new(true);
        let page = Page::new("8", "[Hero] Banner");

        let err = tokio_test::block_on(cache.ensure(&wiki, &page, None)).unwrap_err();

        assert_eq!(err.page_id(), "8");
        assert!(err.to_string().contains("HTTP 500"));
        assert!(!cache.path_for(&page).exists());
    }

    #[test]
    fn creates_missing_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExportCache::new(dir.path().join("nested/exports"));
        let wiki = CountingWiki::new(false);
        let page = Page::new("1", "[A] b");

        let cached = tokio_test::block_on(cache.ensure(&wiki, &page, None)).unwrap();
        assert!(cached.path.exists());
    }
}
