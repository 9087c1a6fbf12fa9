//! HTTP fetching for pages and images.
//!
//! The resolver and media acquirer only see the [`WebFetcher`] trait, so tests
//! can swap in canned responses.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::types::ImageBlob;

/// A fetched resource after redirects.
#[derive(Debug, Clone)]
pub struct WebResponse {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl WebResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Interpret the body as an image, defaulting the type to JPEG.
    pub fn into_image(self) -> ImageBlob {
        let mime_type = self
            .content_type
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_string())
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| "image/jpeg".to_string());
        ImageBlob::new(self.body, mime_type)
    }
}

#[async_trait]
pub trait WebFetcher: Send + Sync {
    /// GET `url`, following redirects. Non-2xx statuses are returned, not errors.
    async fn get(&self, url: &str, timeout: Duration) -> Result<WebResponse, FetchError>;
}

/// reqwest-backed fetcher with a browser-like profile.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        // Map pages serve a stripped-down document to unknown agents
        let user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Http {
                url: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl WebFetcher for HttpFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<WebResponse, FetchError> {
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Http {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.bytes().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(WebResponse {
            url: final_url,
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
