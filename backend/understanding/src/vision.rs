//! Vision understanding via Google's Gemini `generateContent` endpoint.

use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use inkcalc_core::{CalcError, VisionModel, VisionRequest, VisionResponse};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini multimodal provider. Built once at startup and shared.
pub struct GeminiVision {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiVision {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u64>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, `None` when it has no text part.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let mut texts = parts.iter().filter_map(|p| p.text.as_deref()).peekable();
        texts.peek()?;
        Some(texts.collect())
    }

    /// Why no text came back, as reported by the API.
    fn missing_text_reason(&self) -> String {
        let block = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref());
        let finish = self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref());
        match (block, finish) {
            (Some(reason), _) => format!("no text in response (blockReason={})", reason),
            (None, Some(reason)) => format!("no text in response (finishReason={})", reason),
            (None, None) if self.candidates.is_empty() => "no candidates in response".to_string(),
            (None, None) => "no text in response".to_string(),
        }
    }
}

#[async_trait]
impl VisionModel for GeminiVision {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &VisionRequest<'_>) -> Result<VisionResponse> {
        let start = Instant::now();
        info!(
            model = %self.model,
            bytes = request.image.bytes.len(),
            mime = %request.image.mime_type,
            "Describing image via Gemini"
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: request.prompt,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: &request.image.mime_type,
                            data: STANDARD.encode(&request.image.bytes),
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(CalcError::ModelService {
                provider: "gemini".into(),
                message: format!("{}: {}", status, error_body),
            }
            .into());
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let Some(content) = parsed.text() else {
            let message = parsed.missing_text_reason();
            warn!(model = %self.model, reason = %message, "Gemini returned no text");
            return Err(CalcError::ModelService {
                provider: "gemini".into(),
                message,
            }
            .into());
        };
        let tokens_used = parsed
            .usage_metadata
            .and_then(|u| u.total_token_count)
            .unwrap_or(0);
        let latency_ms = start.elapsed().as_millis() as u64;

        debug!(latency_ms, tokens_used, chars = content.len(), "Gemini reply received");

        Ok(VisionResponse {
            content,
            provider: "gemini".to_string(),
            model: self.model.clone(),
            tokens_used,
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkcalc_core::DecodedImage;
    use serde_json::json;

    #[test]
    fn endpoint_uses_model_and_trims_base_url() {
        let vision = GeminiVision::new("key")
            .with_model("gemini-2.0-flash")
            .with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            vision.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn request_body_matches_wire_format() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "solve" },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: "AAAA".into(),
                        },
                    },
                ],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"contents": [{"parts": [
                {"text": "solve"},
                {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}
            ]}]})
        );
    }

    #[test]
    fn reply_text_joins_parts_of_first_candidate() {
        let reply: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "[{'expr': "}, {"text": "'1+1', 'result': 2}]"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"totalTokenCount": 42}
        }))
        .unwrap();
        assert_eq!(reply.text().as_deref(), Some("[{'expr': '1+1', 'result': 2}]"));
        assert_eq!(reply.usage_metadata.unwrap().total_token_count, Some(42));
    }

    #[test]
    fn reply_without_text_names_the_reason() {
        let blocked: GenerateResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert_eq!(blocked.text(), None);
        assert_eq!(
            blocked.missing_text_reason(),
            "no text in response (blockReason=SAFETY)"
        );

        let truncated: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": []}, "finishReason": "RECITATION"}]
        }))
        .unwrap();
        assert_eq!(truncated.text(), None);
        assert_eq!(
            truncated.missing_text_reason(),
            "no text in response (finishReason=RECITATION)"
        );
    }

    async fn serve_once(body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Drain the whole request so closing the socket does not reset it.
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let expected = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + expected {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn blocked_reply_is_a_model_service_error() {
        let base_url = serve_once(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).await;
        let vision = GeminiVision::new("key").with_base_url(base_url);
        let image = DecodedImage {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".into(),
            width: 1,
            height: 1,
        };

        let err = vision
            .generate(&VisionRequest {
                prompt: "solve",
                image: &image,
            })
            .await
            .unwrap_err();
        match err.downcast_ref::<CalcError>() {
            Some(CalcError::ModelService { provider, message }) => {
                assert_eq!(provider, "gemini");
                assert!(message.contains("blockReason=SAFETY"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
