//! Testing utilities including mock implementations.
//!
//! These let the pipeline run end to end without network or AI calls. Every
//! mock records its calls for assertions.

use async_trait::async_trait;
use places_client::{Place, PlacesError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::enrichment::{PlaceAnalysis, PlaceAnalyzer, PlaceDetails, SearchIntent};
use crate::error::{EnrichmentError, FetchError, StoreError};
use crate::fetch::{WebFetcher, WebResponse};
use crate::images::{screenshot_path, ImageStore};
use crate::lookup::PlacesLookup;
use crate::types::ImageBlob;

// =============================================================================
// Mock Web Fetcher
// =============================================================================

/// Canned HTTP responses by URL. Unknown URLs fail as unreachable.
#[derive(Default)]
pub struct MockWebFetcher {
    responses: Arc<RwLock<HashMap<String, WebResponse>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockWebFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_response(self, url: &str, response: WebResponse) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    /// HTML page served at `url`.
    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_response(
            url,
            WebResponse {
                url: url.to_string(),
                status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: html.as_bytes().to_vec(),
            },
        )
    }

    /// `from` redirects to `to`, which serves `html`.
    pub fn with_redirect(self, from: &str, to: &str, html: &str) -> Self {
        let page = WebResponse {
            url: to.to_string(),
            status: 200,
            content_type: Some("text/html".to_string()),
            body: html.as_bytes().to_vec(),
        };
        self.with_response(from, page.clone()).with_response(to, page)
    }

    pub fn with_image(self, url: &str, bytes: &[u8], mime_type: &str) -> Self {
        self.with_response(
            url,
            WebResponse {
                url: url.to_string(),
                status: 200,
                content_type: Some(mime_type.to_string()),
                body: bytes.to_vec(),
            },
        )
    }

    /// Empty response with the given status.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(
            url,
            WebResponse {
                url: url.to_string(),
                status,
                content_type: None,
                body: Vec::new(),
            },
        )
    }

    /// URLs requested, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl WebFetcher for MockWebFetcher {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<WebResponse, FetchError> {
        self.calls.write().unwrap().push(url.to_string());
        self.responses
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Http {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
    }
}

// =============================================================================
// Mock Places Lookup
// =============================================================================

#[derive(Default)]
pub struct MockPlacesLookup {
    unconfigured: bool,
    place: Option<Place>,
    photos: Arc<RwLock<HashMap<String, String>>>,
    photo_failures: Arc<RwLock<HashMap<String, u16>>>,
    searches: Arc<RwLock<Vec<String>>>,
}

impl MockPlacesLookup {
    /// Configured lookup with no candidates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaves like a lookup with no API key.
    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::default()
        }
    }

    /// Candidate returned for every query.
    pub fn with_place(mut self, place: Place) -> Self {
        self.place = Some(place);
        self
    }

    pub fn with_photo(self, photo_ref: &str, uri: &str) -> Self {
        self.photos
            .write()
            .unwrap()
            .insert(photo_ref.to_string(), uri.to_string());
        self
    }

    /// Photo lookup fails with the error's status (500 when it has none).
    pub fn with_photo_error(self, photo_ref: &str, error: PlacesError) -> Self {
        self.photo_failures
            .write()
            .unwrap()
            .insert(photo_ref.to_string(), error.status().unwrap_or(500));
        self
    }

    /// Queries searched, in order.
    pub fn searches(&self) -> Vec<String> {
        self.searches.read().unwrap().clone()
    }

    fn not_configured() -> PlacesError {
        PlacesError::Config("places API key not set".to_string())
    }
}

#[async_trait]
impl PlacesLookup for MockPlacesLookup {
    async fn search(&self, query: &str) -> Result<Option<Place>, PlacesError> {
        if self.unconfigured {
            return Err(Self::not_configured());
        }
        self.searches.write().unwrap().push(query.to_string());
        Ok(self.place.clone())
    }

    async fn photo_uri(&self, photo_ref: &str, _max_px: u32) -> Result<Option<String>, PlacesError> {
        if self.unconfigured {
            return Err(Self::not_configured());
        }
        if let Some(status) = self.photo_failures.read().unwrap().get(photo_ref) {
            return Err(PlacesError::Api {
                status: *status,
                message: "photo lookup failed".to_string(),
            });
        }
        Ok(self.photos.read().unwrap().get(photo_ref).cloned())
    }
}

// =============================================================================
// Mock Analyzer
// =============================================================================

/// Record of a call made to the mock analyzer.
#[derive(Debug, Clone, PartialEq)]
pub enum MockAnalyzerCall {
    AnalyzeImage,
    AnalyzeText { text: String },
    AnalyzePlaceComplex { text: String, image_count: usize },
    GenerateCommentary { name: Option<String> },
    AnalyzeSearchQuery { text: String },
}

#[derive(Default)]
pub struct MockAnalyzer {
    analysis: Option<Result<PlaceAnalysis, EnrichmentError>>,
    intent: Option<SearchIntent>,
    commentary: Option<String>,
    calls: Arc<RwLock<Vec<MockAnalyzerCall>>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analysis returned by every place-analysis call, built from a payload
    /// the way a backend would decode it.
    pub fn with_payload(mut self, raw: serde_json::Value) -> Self {
        self.analysis = Some(PlaceAnalysis::from_value(raw));
        self
    }

    pub fn with_error(mut self, error: EnrichmentError) -> Self {
        self.analysis = Some(Err(error));
        self
    }

    pub fn with_intent(mut self, intent: SearchIntent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_commentary(mut self, text: &str) -> Self {
        self.commentary = Some(text.to_string());
        self
    }

    pub fn calls(&self) -> Vec<MockAnalyzerCall> {
        self.calls.read().unwrap().clone()
    }

    fn record(&self, call: MockAnalyzerCall) {
        self.calls.write().unwrap().push(call);
    }

    fn analysis(&self) -> Result<PlaceAnalysis, EnrichmentError> {
        self.analysis
            .clone()
            .unwrap_or(Err(EnrichmentError::NotConfigured))
    }
}

#[async_trait]
impl PlaceAnalyzer for MockAnalyzer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze_image(&self, _image: &ImageBlob) -> Result<PlaceAnalysis, EnrichmentError> {
        self.record(MockAnalyzerCall::AnalyzeImage);
        self.analysis()
    }

    async fn analyze_text(&self, text: &str) -> Result<PlaceAnalysis, EnrichmentError> {
        self.record(MockAnalyzerCall::AnalyzeText {
            text: text.to_string(),
        });
        self.analysis()
    }

    async fn analyze_place_complex(
        &self,
        text: &str,
        images: &[ImageBlob],
    ) -> Result<PlaceAnalysis, EnrichmentError> {
        self.record(MockAnalyzerCall::AnalyzePlaceComplex {
            text: text.to_string(),
            image_count: images.len(),
        });
        self.analysis()
    }

    async fn generate_commentary(&self, details: &PlaceDetails) -> Result<String, EnrichmentError> {
        self.record(MockAnalyzerCall::GenerateCommentary {
            name: details.name.clone(),
        });
        self.commentary.clone().ok_or(EnrichmentError::Unknown)
    }

    async fn analyze_search_query(&self, text: &str) -> Result<SearchIntent, EnrichmentError> {
        self.record(MockAnalyzerCall::AnalyzeSearchQuery {
            text: text.to_string(),
        });
        self.intent.clone().ok_or(EnrichmentError::ParseFailure)
    }
}

// =============================================================================
// Memory Image Store
// =============================================================================

#[derive(Default)]
pub struct MemoryImageStore {
    images: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.images.read().unwrap().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.images.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn save_screenshot(&self, bytes: &[u8]) -> Result<String, StoreError> {
        let path = screenshot_path();
        self.images
            .write()
            .unwrap()
            .insert(path.clone(), bytes.to_vec());
        Ok(path)
    }
    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.images.write().unwrap().remove(path);
        Ok(())
    }
}
