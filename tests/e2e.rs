//! End-to-end tests against a real Confluence site and the Gemini API.
//!
//! Gated behind `E2E_ENABLED` and the usual credentials so they never run
//! in CI unless explicitly requested. Credentials are read from the
//! environment (a `.env` file is not loaded here).
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Direct mode needs `E2E_PDF` pointing at a local component PDF.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use strip2desc::prompts::MAX_DESCRIPTION_WORDS;
use strip2desc::{
    describe_file, run_pipeline, ConfluenceClient, ConfluenceSettings, DescriptionProvider,
    GeminiClient, GeminiSettings, PipelineConfig, WikiSource,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Return the listed variables, or print why the test is skipped.
fn e2e_env(vars: &[&str]) -> Option<Vec<String>> {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return None;
    }
    let mut values = Vec::with_capacity(vars.len());
    for var in vars {
        match std::env::var(var) {
            Ok(v) if !v.trim().is_empty() => values.push(v),
            _ => {
                println!("SKIP: {var} is not set");
                return None;
            }
        }
    }
    Some(values)
}

fn gemini(key: &str) -> Arc<dyn DescriptionProvider> {
    let model = std::env::var("STRIP2DESC_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into());
    Arc::new(
        GeminiClient::new(
            GeminiSettings::new(key).with_model(model),
            Duration::from_secs(120),
        )
        .unwrap(),
    )
}

fn assert_description_quality(text: &str, context: &str) {
    assert!(!text.trim().is_empty(), "[{context}] description is empty");
    let words = text.split_whitespace().count();
    // Allow some slack over the requested length for model drift.
    assert!(
        words <= 2 * MAX_DESCRIPTION_WORDS,
        "[{context}] description has {words} words"
    );
    println!("[{context}] {words} words:\n{text}\n");
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_describe_local_pdf() {
    let Some(env) = e2e_env(&["GEMINI_API_KEY", "E2E_PDF"]) else {
        return;
    };
    let path = PathBuf::from(&env[1]);

    let text = describe_file(&path, &gemini(&env[0])).await.unwrap();

    assert_description_quality(&text, "direct");
}

#[tokio::test]
async fn e2e_full_run() {
    let Some(env) = e2e_env(&[
        "CONFLUENCE_URL",
        "CONFLUENCE_USERNAME",
        "CONFLUENCE_API_TOKEN",
        "CONFLUENCE_PAGE_ID",
        "GEMINI_API_KEY",
    ]) else {
        return;
    };

    let cache = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .parent_page_id(&env[3])
        .cache_dir(cache.path())
        .request_timeout_secs(120)
        .build()
        .unwrap();
    let wiki: Arc<dyn WikiSource> = Arc::new(
        ConfluenceClient::new(
            ConfluenceSettings::new(&env[0], &env[1], &env[2]),
            config.request_timeout(),
        )
        .unwrap(),
    );
    let provider = gemini(&env[4]);

    let report = run_pipeline(&config, &wiki, &provider).await;

    assert!(
        report.discovery_error.is_none(),
        "discovery failed: {:?}",
        report.discovery_error
    );
    println!("{:#?}", report.stats);
    for (title, text) in report.descriptions() {
        assert_description_quality(text, title);
    }

    // Second run over the same cache only retries pages that failed.
    let again = run_pipeline(&config, &wiki, &provider).await;
    assert!(again.stats.exported <= report.stats.failed);
}
