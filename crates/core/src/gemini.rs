//! Gemini `generateContent` client for image editing.
//!
//! The client sends one inline image plus one text prompt and asks for an
//! `IMAGE` response. It returns the first candidate's parts in order and
//! leaves choosing among them to the pipeline.

use crate::codec::EncodedImagePayload;
use crate::config::Config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One editing request as sent to the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub image: EncodedImagePayload,
    pub prompt: String,
}

/// A content part returned by the service, in response order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    InlineImage { mime_type: String, data: String },
    Text(String),
    Other,
}

/// The remote image editing capability.
///
/// Implementations make exactly one outbound call per `edit` and never retry.
#[async_trait]
pub trait ImageEditService: Send + Sync {
    /// Sends the request and returns the first candidate's parts.
    async fn edit(&self, request: &EditRequest) -> Result<Vec<ContentPart>>;

    /// Identifier of the model requests are addressed to.
    fn model(&self) -> &str;
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: Config,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| AppError::config("credential not set"))
    }

    async fn edit_impl(&self, request: &EditRequest) -> Result<Vec<ContentPart>> {
        let api_key = self.api_key()?;
        let url = self.config.generate_content_url()?;
        let body = GeminiRequest::from_edit_request(request);

        tracing::debug!(
            model = %self.config.model_id(),
            payload_len = request.image.data.len(),
            mime_type = %request.image.mime_type,
            "sending image edit request"
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::remote(format!("Invalid response body: {}", e)))?;

        Ok(gemini_response.into_parts())
    }
}

#[async_trait]
impl ImageEditService for GeminiClient {
    async fn edit(&self, request: &EditRequest) -> Result<Vec<ContentPart>> {
        self.edit_impl(request).await
    }

    fn model(&self) -> &str {
        self.config.model_id()
    }
}

/// Maps a non-success HTTP response to a remote service error, preferring the
/// message from Google's error envelope.
fn parse_error(status: u16, text: &str) -> AppError {
    let message = serde_json::from_str::<ErrorEnvelope>(text)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| text.trim().to_string());

    if message.is_empty() {
        AppError::remote(format!("HTTP {}", status))
    } else {
        AppError::remote(format!("HTTP {}: {}", status, message))
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_edit_request(request: &EditRequest) -> Self {
        // Image first, then the instruction
        let parts = vec![
            RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: request.image.mime_type.clone(),
                    data: request.image.data.clone(),
                },
            },
            RequestPart::Text {
                text: request.prompt.clone(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl GeminiResponse {
    /// Flattens the first candidate into ordered parts. Blocked prompts and
    /// empty candidates yield no parts.
    fn into_parts(self) -> Vec<ContentPart> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            tracing::warn!(block_reason = %reason, "prompt was blocked by the service");
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Vec::new();
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                tracing::warn!(finish_reason = %reason, "candidate finished early");
            }
        }

        candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| match (part.inline_data, part.text) {
                        (Some(inline), _) => ContentPart::InlineImage {
                            mime_type: inline.mime_type,
                            data: inline.data,
                        },
                        (None, Some(text)) => ContentPart::Text(text),
                        (None, None) => ContentPart::Other,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
