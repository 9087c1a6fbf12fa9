//! Remote backend. The response schema is enforced server-side, so output is
//! parsed directly.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use gemini_client::{GeminiClient, Part, StructuredOutput};

use super::prompts::{
    commentary_prompt, search_query_prompt, IMAGE_ANALYSIS_PROMPT, PLACE_ANALYSIS_PROMPT,
    TEXT_ANALYSIS_PROMPT,
};
use super::types::{AnalysisEnvelope, PlaceAnalysis, PlaceDetails, SearchIntent};
use super::PlaceAnalyzer;
use crate::error::EnrichmentError;
use crate::types::ImageBlob;

pub struct GeminiAnalyzer {
    client: Option<GeminiClient>,
    model: String,
}

impl GeminiAnalyzer {
    pub fn new(client: Option<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn client(&self) -> Result<&GeminiClient, EnrichmentError> {
        self.client.as_ref().ok_or(EnrichmentError::NotConfigured)
    }

    async fn structured(
        &self,
        operation: &'static str,
        parts: Vec<Part>,
        schema: Value,
    ) -> Result<Value, EnrichmentError> {
        let (text, usage) = self
            .client()?
            .structured_output(&self.model, parts, schema)
            .await
            .map_err(|e| {
                warn!(operation, model = %self.model, error = %e, "Gemini call failed");
                EnrichmentError::from(&e)
            })?;

        if let Some(usage) = usage {
            info!(
                operation,
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "Gemini token usage"
            );
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(operation, error = %e, "Gemini returned non-JSON despite schema");
            EnrichmentError::ParseFailure
        })
    }

    async fn analysis(
        &self,
        operation: &'static str,
        parts: Vec<Part>,
    ) -> Result<PlaceAnalysis, EnrichmentError> {
        let raw = self
            .structured(operation, parts, AnalysisEnvelope::gemini_schema())
            .await?;
        PlaceAnalysis::from_value(raw)
    }

    async fn extract<T: StructuredOutput>(
        &self,
        operation: &'static str,
        parts: Vec<Part>,
    ) -> Result<T, EnrichmentError> {
        let raw = self.structured(operation, parts, T::gemini_schema()).await?;
        serde_json::from_value(raw).map_err(|_| EnrichmentError::ParseFailure)
    }
}

fn image_parts(images: &[ImageBlob]) -> impl Iterator<Item = Part> + '_ {
    images
        .iter()
        .map(|image| Part::inline(&image.bytes, image.mime_type.clone()))
}

#[async_trait]
impl PlaceAnalyzer for GeminiAnalyzer {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze_image(&self, image: &ImageBlob) -> Result<PlaceAnalysis, EnrichmentError> {
        let mut parts = vec![Part::text(IMAGE_ANALYSIS_PROMPT)];
        parts.extend(image_parts(std::slice::from_ref(image)));
        self.analysis("analyze_image", parts).await
    }

    async fn analyze_text(&self, text: &str) -> Result<PlaceAnalysis, EnrichmentError> {
        let parts = vec![
            Part::text(TEXT_ANALYSIS_PROMPT),
            Part::text(format!("Input text:\n{}", text)),
        ];
        self.analysis("analyze_text", parts).await
    }

    async fn analyze_place_complex(
        &self,
        text: &str,
        images: &[ImageBlob],
    ) -> Result<PlaceAnalysis, EnrichmentError> {
        let mut parts = vec![
            Part::text(PLACE_ANALYSIS_PROMPT),
            Part::text(format!("Place data:\n{}", text)),
        ];
        parts.extend(image_parts(images));
        self.analysis("analyze_place_complex", parts).await
    }

    async fn generate_commentary(&self, details: &PlaceDetails) -> Result<String, EnrichmentError> {
        let text = self
            .client()?
            .generate_text(&self.model, vec![Part::text(commentary_prompt(details))])
            .await
            .map_err(|e| {
                warn!(operation = "generate_commentary", error = %e, "Gemini call failed");
                EnrichmentError::from(&e)
            })?;
        Ok(text.trim().to_string())
    }

    async fn analyze_search_query(&self, text: &str) -> Result<SearchIntent, EnrichmentError> {
        self.extract("analyze_search_query", vec![Part::text(search_query_prompt(text))])
            .await
    }
}
