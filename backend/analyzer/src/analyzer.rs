use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use inkcalc_core::{DecodedImage, ParsedRecord, Variables, VisionModel, VisionRequest};

use crate::cascade::{parse_reply, Tier};
use crate::prompt::build_prompt;

/// Prompts a vision model with an image and parses its reply into records.
///
/// The model handle is built once at startup and shared read-only across
/// requests.
#[derive(Clone)]
pub struct Analyzer {
    model: Arc<dyn VisionModel>,
}

impl Analyzer {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    /// Provider and model identifiers, for health reporting.
    pub fn model_id(&self) -> String {
        format!("{}/{}", self.model.name(), self.model.model())
    }

    /// Analyze one image. Model failures propagate; parse failures do not.
    ///
    /// The returned list may be empty when no tier recovered anything.
    pub async fn analyze(
        &self,
        image: &DecodedImage,
        variables: &Variables,
    ) -> Result<Vec<ParsedRecord>> {
        let prompt = build_prompt(variables);
        debug!(
            provider = %self.model.name(),
            variables = variables.len(),
            prompt_chars = prompt.len(),
            "Submitting image to vision model"
        );

        let response = self
            .model
            .generate(&VisionRequest {
                prompt: &prompt,
                image,
            })
            .await?;

        info!(
            provider = %response.provider,
            model = %response.model,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Vision model responded"
        );
        debug!(reply = %response.content, "Raw model reply");

        let (records, tier) = parse_reply(&response.content);
        match tier {
            Tier::Exhausted => warn!("Model reply yielded no records"),
            _ => info!(tier = ?tier, records = records.len(), "Parsed model reply"),
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkcalc_core::VarValue;
    use inkcalc_understanding::MockVisionModel;
    use serde_json::json;

    fn image() -> DecodedImage {
        DecodedImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            mime_type: "image/png".into(),
            width: 1,
            height: 1,
        }
    }

    #[tokio::test]
    async fn parses_model_reply() {
        let model = Arc::new(MockVisionModel::new("mock").with_response(
            "[{'expr': 'x', 'result': 4, 'assign': True}]",
        ));
        let analyzer = Analyzer::new(model.clone());

        let mut vars = Variables::new();
        vars.insert("y".into(), VarValue::Number(2.into()));
        let records = analyzer.analyze(&image(), &vars).await.unwrap();

        assert_eq!(model.calls(), 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].result, Some(json!(4)));
        assert!(records[0].assign);
    }

    #[tokio::test]
    async fn unusable_reply_is_empty_not_error() {
        let model = Arc::new(MockVisionModel::new("mock").with_response("no idea, sorry"));
        let records = Analyzer::new(model)
            .analyze(&image(), &Variables::new())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let model = Arc::new(MockVisionModel::new("mock").failing("503 Service Unavailable"));
        let err = Analyzer::new(model)
            .analyze(&image(), &Variables::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn model_id_names_provider_and_model() {
        let analyzer = Analyzer::new(Arc::new(MockVisionModel::new("offline")));
        assert_eq!(analyzer.model_id(), "offline/mock");
    }
}
