//! Pure Gemini REST API client
//!
//! A clean, minimal client for the `generateContent` endpoint with no
//! domain-specific logic. Supports text and inline image parts, and
//! schema-constrained JSON output.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_client::{GeminiClient, Part};
//!
//! let client = GeminiClient::new(std::env::var("GEMINI_API_KEY")?);
//!
//! let text = client
//!     .generate_text("gemini-2.0-flash", vec![Part::text("Hello!")])
//!     .await?;
//! ```
//!
//! # Schema-Constrained Output
//!
//! ```rust,ignore
//! use gemini_client::StructuredOutput;
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Filters {
//!     keywords: Option<String>,
//! }
//!
//! let (json, usage) = client
//!     .structured_output("gemini-2.0-flash", vec![Part::text(prompt)], Filters::gemini_schema())
//!     .await?;
//! let filters: Filters = serde_json::from_str(&json)?;
//! ```

pub mod error;
pub mod schema;
pub mod types;

pub use error::{GeminiError, Result};
pub use schema::{gemini_compatible, StructuredOutput};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Set a custom base URL (for proxies, test servers, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-request timeout (default: 60s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw `generateContent` call.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, model = %model, "Gemini request failed");
                GeminiError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<types::ErrorEnvelope>(&body) {
                Ok(envelope) => match envelope.error.status {
                    Some(code) => format!("{}: {}", code, envelope.error.message),
                    None => envelope.error.message,
                },
                Err(_) => body,
            };
            warn!(status = %status, error = %message, "Gemini API error");
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        debug!(
            model = %model,
            duration_ms = start.elapsed().as_millis(),
            "Gemini generateContent"
        );

        Ok(parsed)
    }

    /// Free-form text generation.
    pub async fn generate_text(&self, model: &str, parts: Vec<Part>) -> Result<String> {
        let request = GenerateContentRequest::from_parts(parts);
        let response = self.generate_content(model, &request).await?;
        response
            .text()
            .ok_or_else(|| GeminiError::Parse("No candidates in Gemini response".into()))
    }

    /// Structured output with an explicit response schema.
    ///
    /// Returns the JSON text of the first candidate together with token usage.
    pub async fn structured_output(
        &self,
        model: &str,
        parts: Vec<Part>,
        schema: serde_json::Value,
    ) -> Result<(String, Option<UsageMetadata>)> {
        let request = GenerateContentRequest::from_parts(parts).with_response_schema(schema);
        let response = self.generate_content(model, &request).await?;
        let usage = response.usage_metadata;
        let text = response
            .text()
            .ok_or_else(|| GeminiError::Parse("No candidates in Gemini response".into()))?;
        Ok((text, usage))
    }
}
