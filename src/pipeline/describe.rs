//! Description generation: one PDF in, one short description out.
//!
//! Thin on purpose. The prompt lives in [`crate::prompts`], transport and
//! error mapping live in the provider. This stage reads the file, makes
//! exactly one call (no retries) and tidies the answer.

use crate::clients::DescriptionProvider;
use crate::error::Strip2DescError;
use crate::prompts::DESCRIPTION_PROMPT;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Read `path` and ask `provider` to describe it with [`DESCRIPTION_PROMPT`].
pub async fn describe_pdf(
    provider: &dyn DescriptionProvider,
    path: &Path,
) -> Result<String, Strip2DescError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Strip2DescError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let start = Instant::now();
    let text = provider.generate(&bytes, DESCRIPTION_PROMPT).await?;
    debug!(
        "{} ({}) answered for {} in {:?}",
        provider.name(),
        provider.model(),
        path.display(),
        start.elapsed()
    );

    Ok(tidy(&text))
}

/// Normalise line endings and trim surrounding whitespace. The wording itself
/// is left untouched.
fn tidy(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string()
}
