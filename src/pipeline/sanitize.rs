//! Filename sanitising: turn a page title into a safe cache-file name.
//!
//! Titles are free text and routinely contain `/` or `:` ("CTA / Button",
//! "Hero: dark"), which would either create sub-directories or fail outright
//! on Windows. Each character from `\ / : * ? " < > |` becomes `_`, then the
//! result is trimmed. Two titles that differ only in those characters map to
//! the same file; that collision is accepted.

use crate::clients::Page;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_RESTRICTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());

/// Replace filesystem-hostile characters with `_` and trim surrounding whitespace.
pub fn sanitize_filename(title: &str) -> String {
    RE_RESTRICTED.replace_all(title, "_").trim().to_string()
}

/// Name of the cache file for `page`: `<sanitized title>.pdf`.
///
/// A title that sanitises to nothing falls back to the page id so the file
/// is never called just `.pdf`.
pub fn cache_file_name(page: &Page) -> String {
    let stem = sanitize_filename(&page.title);
    if stem.is_empty() {
        format!("{}.pdf", sanitize_filename(&page.id))
    } else {
        format!("{stem}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESTRICTED: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

    #[test]
    fn replaces_every_restricted_char() {
        assert_eq!(
            sanitize_filename(r#"a\b/c:d*e?f"g<h>i|j"#),
            "a_b_c_d_e_f_g_h_i_j"
        );
    }

    #[test]
    fn trims_after_replacing() {
        assert_eq!(sanitize_filename("  [CTA] Button / Link  "), "[CTA] Button _ Link");
    }

    #[test]
    fn output_never_contains_restricted_chars() {
        let titles = [
            "[Hero Banner] Intro",
            "Q&A: what? why*",
            "<script>|\"quoted\"|",
            "\\\\server\\share",
            "",
            "   ",
        ];
        for t in titles {
            let s = sanitize_filename(t);
            assert!(!s.contains(RESTRICTED), "{t:?} → {s:?}");
        }
    }

    #[test]
    fn sanitizing_is_idempotent() {
        for t in ["a/b", " x:y ", "[Tag] Name?", "plain", "\" lead"] {
            let once = sanitize_filename(t);
            assert_eq!(sanitize_filename(&once), once, "input {t:?}");
        }
    }

    #[test]
    fn safe_titles_pass_through() {
        assert_eq!(sanitize_filename("[Hero Banner] Intro"), "[Hero Banner] Intro");
    }

    #[test]
    fn distinct_titles_may_collide() {
        assert_eq!(sanitize_filename("A/B"), sanitize_filename("A:B"));
    }

    #[test]
    fn cache_file_name_appends_extension() {
        assert_eq!(
            cache_file_name(&Page::new("1", "[CTA] Button")),
            "[CTA] Button.pdf"
        );
    }

    #[test]
    fn cache_file_name_falls_back_to_id() {
        assert_eq!(cache_file_name(&Page::new("4711", " ?? ")), "__.pdf");
        assert_eq!(cache_file_name(&Page::new("4711", "   ")), "4711.pdf");
    }
}
