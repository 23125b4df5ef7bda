//! Gemini `generateContent` client with the PDF sent as an inline part.
//!
//! The request carries one user turn with two parts, in this order:
//! the PDF as base64 `inlineData` (`application/pdf`), then the prompt text.
//! The API key travels in the `x-goog-api-key` header so it never appears in
//! a URL that could end up in a log line.

use crate::clients::provider::DescriptionProvider;
use crate::config::GeminiSettings;
use crate::error::Strip2DescError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "gemini";
const PDF_MIME: &str = "application/pdf";

/// [`DescriptionProvider`] backed by the Gemini Developer API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    /// Validate `settings` and build a client whose requests time out after `timeout`.
    pub fn new(settings: GeminiSettings, timeout: Duration) -> Result<Self, Strip2DescError> {
        settings.validate()?;
        Ok(Self {
            http: super::http_client(timeout)?,
            settings,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url, self.settings.model
        )
    }
}

#[async_trait]
impl DescriptionProvider for GeminiClient {
    fn name(&self) -> &str {
        SERVICE
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, pdf: &[u8], prompt: &str) -> Result<String, Strip2DescError> {
        let url = self.endpoint();
        let request = GenerateContentRequest::pdf_with_prompt(pdf, prompt);
        debug!(
            "Gemini request: model {}, {} PDF bytes",
            self.settings.model,
            pdf.len()
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Strip2DescError::http(&url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Strip2DescError::http(&url, e))?;

        if !status.is_success() {
            let detail = api_error_message(&body).unwrap_or_else(|| format!("HTTP {status}"));
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Strip2DescError::AuthError {
                    service: SERVICE.into(),
                    detail,
                },
                StatusCode::TOO_MANY_REQUESTS => Strip2DescError::RateLimited {
                    service: SERVICE.into(),
                    detail,
                },
                // Invalid keys come back as 400 INVALID_ARGUMENT.
                StatusCode::BAD_REQUEST if detail.contains("API key") => {
                    Strip2DescError::AuthError {
                        service: SERVICE.into(),
                        detail,
                    }
                }
                _ => Strip2DescError::GenerationFailed {
                    provider: SERVICE.into(),
                    detail,
                },
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| Strip2DescError::GenerationFailed {
                provider: SERVICE.into(),
                detail: format!("unreadable response: {e}"),
            })?;
        parsed.into_text()
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn pdf_with_prompt(pdf: &[u8], prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: PDF_MIME.into(),
                            data: BASE64.encode(pdf),
                        }),
                    },
                    Part {
                        text: Some(prompt.to_string()),
                        inline_data: None,
                    },
                ],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason", default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String, Strip2DescError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(match block_reason {
                Some(reason) => Strip2DescError::ContentBlocked { reason },
                None => Strip2DescError::GenerationFailed {
                    provider: SERVICE.into(),
                    detail: "response contained no candidates".into(),
                },
            });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if !text.trim().is_empty() {
            return Ok(text);
        }
        match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "RECITATION")) => {
                Err(Strip2DescError::ContentBlocked {
                    reason: reason.to_string(),
                })
            }
            other => Err(Strip2DescError::GenerationFailed {
                provider: SERVICE.into(),
                detail: format!(
                    "empty answer (finish reason: {})",
                    other.unwrap_or("unknown")
                ),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    status: Option<String>,
}

/// Extract the `error.message` (or `error.status`) from an API error body.
fn api_error_message(body: &str) -> Option<String> {
    let parsed: ApiErrorResponse = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    error.message.or(error.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_puts_pdf_before_prompt() {
        let req = GenerateContentRequest::pdf_with_prompt(b"%PDF-1.7", "Describe it.");
        let json = serde_json::to_value(&req).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(parts[0]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(parts[0]["inlineData"]["data"], BASE64.encode(b"%PDF-1.7"));
        assert!(parts[0].get("text").is_none());
        assert_eq!(parts[1]["text"], "Describe it.");
    }

    #[test]
    fn response_text_is_concatenated() {
        let body = r#"{"candidates": [{"content": {"role": "model",
            "parts": [{"text": "Allows visitors "}, {"text": "to browse offers."}]},
            "finishReason": "STOP"}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.into_text().unwrap(), "Allows visitors to browse offers.");
    }

    #[test]
    fn blocked_prompt_is_reported() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            resp.into_text(),
            Err(Strip2DescError::ContentBlocked { reason }) if reason == "SAFETY"
        ));
    }

    #[test]
    fn empty_candidate_reports_finish_reason() {
        let body = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let err = resp.into_text().unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"), "got: {err}");
    }

    #[test]
    fn api_error_message_is_extracted() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(
            api_error_message(body).as_deref(),
            Some("API key not valid. Please pass a valid API key.")
        );
        assert_eq!(api_error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn endpoint_uses_model() {
        let client = GeminiClient::new(
            GeminiSettings::new("key").with_base_url("http://localhost:8080/v1beta/"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(client.model(), "gemini-2.5-flash");
    }
}
