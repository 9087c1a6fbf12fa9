//! AI enrichment: structured attributes and commentary from text + images.
//!
//! Two interchangeable backends implement [`PlaceAnalyzer`]. The backend is
//! picked once from configuration; [`EnrichmentEngine`] wraps it and logs
//! failures without letting upstream text escape.

pub mod decode;
pub mod gemini;
pub mod local;
pub mod prompts;
pub mod types;

pub use decode::decode;
pub use gemini::GeminiAnalyzer;
pub use local::LocalAnalyzer;
pub use types::{AnalysisEnvelope, PlaceAnalysis, PlaceDetails, SearchIntent};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use gemini_client::GeminiClient;

use crate::config::{AiMode, Config};
use crate::error::EnrichmentError;
use crate::types::ImageBlob;

/// Capability set shared by all AI backends.
#[async_trait]
pub trait PlaceAnalyzer: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    async fn analyze_image(&self, image: &ImageBlob) -> Result<PlaceAnalysis, EnrichmentError>;

    async fn analyze_text(&self, text: &str) -> Result<PlaceAnalysis, EnrichmentError>;

    /// Primary path: instruction + context + every image in one call.
    async fn analyze_place_complex(
        &self,
        text: &str,
        images: &[ImageBlob],
    ) -> Result<PlaceAnalysis, EnrichmentError>;

    async fn generate_commentary(&self, details: &PlaceDetails) -> Result<String, EnrichmentError>;

    async fn analyze_search_query(&self, text: &str) -> Result<SearchIntent, EnrichmentError>;
}

#[derive(Clone)]
pub struct EnrichmentEngine {
    analyzer: Arc<dyn PlaceAnalyzer>,
}

impl EnrichmentEngine {
    pub fn new(analyzer: Arc<dyn PlaceAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Build the configured backend. A missing key yields a backend that
    /// answers every call with `NotConfigured`.
    pub fn from_config(config: &Config) -> Self {
        let analyzer: Arc<dyn PlaceAnalyzer> = match config.ai_mode {
            AiMode::Gemini => {
                let client = config.gemini_api_key.as_ref().map(|key| {
                    GeminiClient::new(key.clone()).with_timeout(config.timeouts.remote_ai)
                });
                if client.is_none() {
                    warn!("GEMINI_API_KEY is not set, enrichment is disabled");
                }
                Arc::new(GeminiAnalyzer::new(client, config.gemini_model.clone()))
            }
            AiMode::Local => Arc::new(LocalAnalyzer::new(
                config.local_model_url.clone(),
                config.local_model_name.clone(),
                config.timeouts.local_ai,
            )),
        };
        info!(backend = analyzer.name(), "Enrichment backend selected");
        Self { analyzer }
    }

    pub fn backend(&self) -> &str {
        self.analyzer.name()
    }

    pub async fn analyze(
        &self,
        context_text: &str,
        images: &[ImageBlob],
    ) -> Result<PlaceAnalysis, EnrichmentError> {
        self.analyzer
            .analyze_place_complex(context_text, images)
            .await
            .inspect_err(|e| {
                warn!(backend = self.analyzer.name(), error = %e, "Place analysis failed");
            })
    }

    pub async fn search_intent(&self, text: &str) -> Result<SearchIntent, EnrichmentError> {
        self.analyzer
            .analyze_search_query(text)
            .await
            .inspect_err(|e| {
                warn!(backend = self.analyzer.name(), error = %e, "Search query analysis failed");
            })
    }

    pub async fn commentary(&self, details: &PlaceDetails) -> Result<String, EnrichmentError> {
        self.analyzer
            .generate_commentary(details)
            .await
            .inspect_err(|e| {
                warn!(backend = self.analyzer.name(), error = %e, "Commentary generation failed");
            })
    }
}
