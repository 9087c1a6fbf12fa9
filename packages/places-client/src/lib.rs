//! Pure Places API (New) REST client.
//!
//! A minimal client for text search and photo media resolution.
//!
//! # Example
//!
//! ```rust,ignore
//! use places_client::{FieldMask, PlacesClient};
//!
//! let client = PlacesClient::new("api-key".into());
//!
//! let places = client.search_text("Test Cafe District 1", &FieldMask::basic()).await?;
//! if let Some(best) = places.first() {
//!     println!("{}", best.display_name_text().unwrap_or("(unnamed)"));
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{PlacesError, Result};
pub use types::{
    FieldMask, LatLng, LocalizedText, OpeningHours, Photo, PhotoMedia, Place, Review,
    SearchTextRequest, SearchTextResponse,
};

use std::time::Duration;

const BASE_URL: &str = "https://places.googleapis.com/v1";

#[derive(Clone)]
pub struct PlacesClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl PlacesClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Per-request timeout (default: 10s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Text search. Candidates come back ranked, best match first.
    pub async fn search_text(&self, query: &str, mask: &FieldMask) -> Result<Vec<Place>> {
        let url = format!("{}/places:searchText", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", mask.header_value())
            .timeout(self.timeout)
            .json(&SearchTextRequest {
                text_query: query.to_string(),
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlacesError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: SearchTextResponse = resp.json().await?;
        tracing::debug!(query, count = parsed.places.len(), "Places text search");
        Ok(parsed.places)
    }

    /// Resolve a photo resource name to a short-lived direct image URI.
    ///
    /// Uses `skipHttpRedirect` so the URI comes back as JSON instead of a 302.
    pub async fn photo_media(
        &self,
        photo_name: &str,
        max_width_px: u32,
        max_height_px: u32,
    ) -> Result<PhotoMedia> {
        let url = format!("{}/{}/media", self.base_url, photo_name);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.clone()),
                ("maxHeightPx", max_height_px.to_string()),
                ("maxWidthPx", max_width_px.to_string()),
                ("skipHttpRedirect", "true".to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlacesError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }
}
