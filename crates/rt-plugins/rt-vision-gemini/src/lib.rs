//! # rt-vision-gemini
//!
//! Gemini `generateContent` implementation of `VisionVerifier`.
//! One request per call, no retries: a failed call surfaces to the annotator
//! straight away.

use std::time::Duration;

use async_trait::async_trait;
use rt_core::error::{AppError, Result};
use rt_core::models::Verdict;
use rt_core::traits::VisionVerifier;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Instruction sent alongside every overlay.
pub const PROMPT: &str = "The image shows a green bounding box drawn by a human annotator. \
Check whether the box fully encloses the main subject and whether it is well fitted, \
too large or too small. Start your answer with exactly one word, \"Valid\" or \"Invalid\", \
then give a short reason.";

pub struct GeminiVerifier {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl GeminiVerifier {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ReplyContent>,
}

#[derive(Debug, Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

fn build_request(jpeg_base64: &str) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: PROMPT },
                Part::Image {
                    inline_data: InlineData {
                        mime_type: "image/jpeg",
                        data: jpeg_base64,
                    },
                },
            ],
        }],
    }
}

/// Concatenated text parts of the first candidate, if it has any.
fn reply_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl VisionVerifier for GeminiVerifier {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn verify(&self, jpeg_base64: &str) -> Result<Verdict> {
        let Some(key) = &self.api_key else {
            return Err(AppError::ExternalService(
                "vision api key is not configured".into(),
            ));
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key.expose_secret())
            .json(&build_request(jpeg_base64))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "vision service returned {status}: {body}"
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("malformed reply: {e}")))?;

        let text = reply_text(parsed)
            .ok_or_else(|| AppError::ExternalService("vision reply contained no text".into()))?;
        debug!(reply_len = text.len(), "vision reply received");

        Ok(Verdict::from_reply(text))
    }
}
