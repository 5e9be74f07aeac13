use anyhow::Result;
use async_trait::async_trait;

use crate::types::DecodedImage;

/// Trait for multimodal models that read an image alongside a text prompt.
///
/// Implementations hold no per-request state and are shared across requests
/// behind an `Arc`.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name (e.g., "gemini", "mock").
    fn name(&self) -> &str;

    /// Model identifier used for requests.
    fn model(&self) -> &str;

    /// Submit the prompt and image together and return the reply text.
    async fn generate(&self, request: &VisionRequest<'_>) -> Result<VisionResponse>;
}

/// Request to a vision model.
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    pub prompt: &'a str,
    pub image: &'a DecodedImage,
}

/// Response from a vision model.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
