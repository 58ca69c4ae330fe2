//! # Caption Service Client
//!
//! Thin client for a remote vision-language endpoint that produces an
//! accessibility caption for an image. One request per call, no retry: a
//! failed call surfaces as a caption error and the item's caption stays
//! absent until the user asks again.
//!
//! The instruction string and sampling parameters are fixed. The API key is
//! read from the environment at call time; a missing key is a hard failure
//! rather than a degraded mode.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::core::data_url::strip_data_url_prefix;
use crate::error::{OptimizeError, OptimizeResult};

/// Environment variable holding the caption API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Default captioning endpoint.
const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Fixed captioning instruction, 120-character guidance baked in.
const CAPTION_PROMPT: &str = "Describe this image in one short English sentence suitable as \
accessibility alt text. Keep it under 120 characters and do not mention that it is an image.";

/// Returned when the endpoint answers with empty text.
const EMPTY_CAPTION_PLACEHOLDER: &str = "No description available.";

/// Request timeout for one caption call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Abstract interface for caption generation backends.
#[async_trait]
pub trait CaptionBackend: Send + Sync {
    /// Generate a caption for the image carried by `data_url` (a base64
    /// data URL; a bare base64 payload is also accepted). Returns trimmed
    /// text, never empty.
    async fn caption(&self, data_url: &str, mime: &str) -> OptimizeResult<String>;
}

/// Caption client for the Gemini generateContent API.
pub struct GeminiCaptionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl Default for GeminiCaptionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiCaptionClient {
    /// Create a client against the default endpoint.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a client against a custom endpoint (used by tests and
    /// self-hosted gateways).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CaptionBackend for GeminiCaptionClient {
    async fn caption(&self, data_url: &str, mime: &str) -> OptimizeResult<String> {
        let key = std::env::var(API_KEY_VAR).map_err(|_| OptimizeError::auth(API_KEY_VAR))?;
        let payload = strip_data_url_prefix(data_url);

        let request_body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": CAPTION_PROMPT },
                    { "inline_data": { "mime_type": mime, "data": payload } }
                ]
            }],
            "generationConfig": {
                "temperature": 0.4,
                "topP": 0.95,
                "maxOutputTokens": 120
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", key.as_str())])
            .json(&request_body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| OptimizeError::http("caption request", e))?;

        if !response.status().is_success() {
            return Err(OptimizeError::caption(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OptimizeError::http("caption response", e))?;
        debug!(target: "caption", "caption endpoint answered");

        Ok(extract_caption_text(&body))
    }
}

/// Pull the first candidate's text out of a generateContent response,
/// trimmed, falling back to the fixed placeholder when it is empty.
fn extract_caption_text(body: &serde_json::Value) -> String {
    let text = body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or("")
        .trim();

    if text.is_empty() {
        EMPTY_CAPTION_PLACEHOLDER.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_trims_text() {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  A red bicycle leaning on a wall.  " }] }
            }]
        });
        assert_eq!(
            extract_caption_text(&body),
            "A red bicycle leaning on a wall."
        );
    }

    #[test]
    fn test_extract_empty_yields_placeholder() {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "   " }] } }]
        });
        assert_eq!(extract_caption_text(&body), EMPTY_CAPTION_PLACEHOLDER);

        let missing = serde_json::json!({ "candidates": [] });
        assert_eq!(extract_caption_text(&missing), EMPTY_CAPTION_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_missing_credential_is_hard_failure() {
        // Key lookup happens at call time, so clearing it here is what a
        // caller without configuration observes.
        unsafe { std::env::remove_var(API_KEY_VAR) };

        let client = GeminiCaptionClient::new();
        let err = client
            .caption("data:image/png;base64,AAAA", "image/png")
            .await
            .unwrap_err();
        assert_eq!(err.category(), "auth");
    }
}
