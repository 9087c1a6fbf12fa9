//! Locally hosted model backend (Ollama-compatible `/api/generate`).
//!
//! No server-side schema, so every structured response goes through the
//! defensive decoder.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::decode::decode;
use super::prompts::{
    commentary_prompt, search_query_prompt, IMAGE_ANALYSIS_PROMPT, PLACE_ANALYSIS_PROMPT,
    TEXT_ANALYSIS_PROMPT,
};
use super::types::{PlaceAnalysis, PlaceDetails, SearchIntent};
use super::PlaceAnalyzer;
use crate::error::EnrichmentError;
use crate::types::ImageBlob;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

pub struct LocalAnalyzer {
    http_client: reqwest::Client,
    url: String,
    model: String,
    timeout: Duration,
}

impl LocalAnalyzer {
    pub fn new(url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            url: url.into(),
            model: model.into(),
            timeout,
        }
    }

    async fn generate(
        &self,
        prompt: String,
        images: &[ImageBlob],
        json: bool,
    ) -> Result<String, EnrichmentError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            images: images.iter().map(|i| STANDARD.encode(&i.bytes)).collect(),
            stream: false,
            format: json.then_some("json"),
        };

        debug!(model = %self.model, image_count = images.len(), "Local model request");

        let response = self
            .http_client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "Local model request failed");
                EnrichmentError::Network
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Local model error");
            return Err(EnrichmentError::from_status(status.as_u16()));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Local model returned an unexpected envelope");
            EnrichmentError::ParseFailure
        })?;
        Ok(body.response)
    }

    async fn analysis(
        &self,
        prompt: String,
        images: &[ImageBlob],
    ) -> Result<PlaceAnalysis, EnrichmentError> {
        let text = self.generate(prompt, images, true).await?;
        PlaceAnalysis::from_value(decode(&text)?)
    }
}

#[async_trait]
impl PlaceAnalyzer for LocalAnalyzer {
    fn name(&self) -> &str {
        "local"
    }

    async fn analyze_image(&self, image: &ImageBlob) -> Result<PlaceAnalysis, EnrichmentError> {
        self.analysis(IMAGE_ANALYSIS_PROMPT.to_string(), std::slice::from_ref(image))
            .await
    }

    async fn analyze_text(&self, text: &str) -> Result<PlaceAnalysis, EnrichmentError> {
        self.analysis(format!("{}\n\nInput text:\n{}", TEXT_ANALYSIS_PROMPT, text), &[])
            .await
    }

    async fn analyze_place_complex(
        &self,
        text: &str,
        images: &[ImageBlob],
    ) -> Result<PlaceAnalysis, EnrichmentError> {
        self.analysis(format!("{}\n\nPlace data:\n{}", PLACE_ANALYSIS_PROMPT, text), images)
            .await
    }

    async fn generate_commentary(&self, details: &PlaceDetails) -> Result<String, EnrichmentError> {
        let text = self.generate(commentary_prompt(details), &[], false).await?;
        Ok(text.trim().to_string())
    }

    async fn analyze_search_query(&self, text: &str) -> Result<SearchIntent, EnrichmentError> {
        let response = self.generate(search_query_prompt(text), &[], true).await?;
        serde_json::from_value(decode(&response)?).map_err(|_| EnrichmentError::ParseFailure)
    }
}
