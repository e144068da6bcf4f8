//! Gemini image transform client
//!
//! Sends a raw product image plus a styling prompt to the Gemini
//! generateContent endpoint and returns the generated image bytes. Each call
//! produces exactly one variant; the enhancement pipeline invokes it once per
//! desired variant and treats every call as independently fallible.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// One generated image variant
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub data: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait ImageTransform: Send + Sync {
    /// Generate one enhanced variant of `image` guided by `prompt`.
    /// Failures (timeout, quota, content policy) are per-call and never
    /// affect sibling variants.
    async fn generate(
        &self,
        image: &[u8],
        content_type: &str,
        prompt: &str,
    ) -> Result<GeneratedImage>;
}

// ============================================
// Request types
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart {
    InlineData(Blob),
    Text(String),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    /// Base64-encoded bytes
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

// ============================================
// Response types
// ============================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ResponsePart {
    #[serde(alias = "inline_data")]
    inline_data: Option<Blob>,
    text: Option<String>,
}

/// Gemini API client
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    /// Check whether an API key is configured
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl ImageTransform for GeminiClient {
    async fn generate(
        &self,
        image: &[u8],
        content_type: &str,
        prompt: &str,
    ) -> Result<GeneratedImage> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::InlineData(Blob {
                        mime_type: content_type.to_string(),
                        data: base64::engine::general_purpose::STANDARD.encode(image),
                    }),
                    RequestPart::Text(prompt.to_string()),
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            },
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );

        let start = std::time::Instant::now();
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Transform(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gemini API request failed");
            return Err(AppError::Transform(format!(
                "Gemini API error ({status}): {body}"
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transform(format!("Failed to parse Gemini response: {e}")))?;

        debug!(
            elapsed_ms = start.elapsed().as_millis(),
            model = %self.model,
            "Gemini response received"
        );

        // The model interleaves text and image parts; the image is the result.
        let blob = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .ok_or_else(|| {
                AppError::Transform("Gemini response contained no image data".to_string())
            })?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(blob.data.as_bytes())
            .map_err(|e| AppError::Transform(format!("Invalid base64 image data: {e}")))?;

        Ok(GeneratedImage {
            data: Bytes::from(data),
            content_type: blob.mime_type,
        })
    }
}
