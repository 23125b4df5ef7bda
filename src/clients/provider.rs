//! Generative-AI collaborator interface.

use crate::error::Strip2DescError;
use async_trait::async_trait;

/// A model that can read a PDF and answer a prompt about it.
#[async_trait]
pub trait DescriptionProvider: Send + Sync {
    /// Provider name used in log lines and error messages.
    fn name(&self) -> &str;

    /// Model identifier, e.g. `gemini-2.5-flash`.
    fn model(&self) -> &str;

    /// Send the PDF bytes followed by `prompt`; return the generated text.
    async fn generate(&self, pdf: &[u8], prompt: &str) -> Result<String, Strip2DescError>;
}
