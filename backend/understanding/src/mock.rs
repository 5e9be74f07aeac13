use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use inkcalc_core::{VisionModel, VisionRequest, VisionResponse};

/// A vision model that returns a canned reply, for tests and offline runs.
pub struct MockVisionModel {
    name: String,
    fixed_response: Option<String>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockVisionModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Make every call fail with the given message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionModel for MockVisionModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _req: &VisionRequest<'_>) -> Result<VisionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            bail!("{}", message);
        }
        Ok(VisionResponse {
            content: self
                .fixed_response
                .clone()
                .unwrap_or_else(|| "[{'expr': '1 + 1', 'result': 2}]".to_string()),
            provider: self.name.clone(),
            model: "mock".to_string(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkcalc_core::DecodedImage;

    fn blank() -> DecodedImage {
        DecodedImage {
            bytes: Vec::new(),
            mime_type: "image/png".into(),
            width: 0,
            height: 0,
        }
    }

    #[tokio::test]
    async fn returns_fixed_response_and_counts_calls() {
        let model = MockVisionModel::new("mock").with_response("42");
        let image = blank();
        let req = VisionRequest {
            prompt: "solve",
            image: &image,
        };
        assert_eq!(model.generate(&req).await.unwrap().content, "42");
        assert_eq!(model.generate(&req).await.unwrap().content, "42");
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn failing_mock_errors() {
        let model = MockVisionModel::new("mock").failing("service unavailable");
        let image = blank();
        let err = model
            .generate(&VisionRequest {
                prompt: "solve",
                image: &image,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "service unavailable");
        assert_eq!(model.calls(), 1);
    }
}
