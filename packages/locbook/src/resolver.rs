//! Source resolution: link → canonical URL, scraped metadata, structured
//! place data and candidate images.
//!
//! Each network step degrades independently. Resolution only fails when
//! neither the page scrape nor the places lookup produced anything.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use places_client::{Place, PlacesError};

use crate::config::Config;
use crate::error::ResolveError;
use crate::fetch::{WebFetcher, WebResponse};
use crate::links::{is_short_link, name_from_url};
use crate::lookup::PlacesLookup;
use crate::media::MediaAcquirer;
use crate::scrape::PageMeta;
use crate::types::{GeoPoint, ImageBlob};

pub const API_SOURCE_MARKER: &str = "Source: API (Google Places)";
pub const SCRAPE_SOURCE_MARKER: &str = "Source: scraping, low confidence";

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Review excerpts included in the AI context
    pub max_reviews: usize,
    pub image_analysis: bool,
    pub max_provider_photos: usize,
    pub review_excerpt_chars: usize,
    pub lookup_timeout: Duration,
    pub image_timeout: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_reviews: 5,
            image_analysis: false,
            max_provider_photos: 3,
            review_excerpt_chars: 300,
            lookup_timeout: Duration::from_secs(10),
            image_timeout: Duration::from_secs(5),
        }
    }
}

impl ResolverOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_reviews: config.max_reviews_for_ai,
            image_analysis: config.feat_image_analysis,
            lookup_timeout: config.timeouts.lookup,
            image_timeout: config.timeouts.image_download,
            ..Self::default()
        }
    }
}

/// Merged evidence for one input. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ResolvedPlaceInfo {
    pub canonical_url: String,
    /// Best name guess: URL path, then og:title, then page title
    pub inferred_name: Option<String>,
    pub structured: Option<Place>,
    pub scraped_title: Option<String>,
    pub og_title: Option<String>,
    pub images: Vec<ImageBlob>,
    pub context_text: String,
}

impl ResolvedPlaceInfo {
    pub fn is_low_confidence(&self) -> bool {
        self.structured.is_none()
    }

    /// Provider coordinates, when the lookup returned any.
    pub fn location(&self) -> Option<GeoPoint> {
        self.structured
            .as_ref()
            .and_then(|p| p.location)
            .map(GeoPoint::from)
    }

    pub fn address(&self) -> Option<&str> {
        self.structured
            .as_ref()
            .and_then(|p| p.formatted_address.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub location: GeoPoint,
    pub formatted_address: Option<String>,
}

pub struct SourceResolver {
    fetcher: Arc<dyn WebFetcher>,
    lookup: Arc<dyn PlacesLookup>,
    media: MediaAcquirer,
    options: ResolverOptions,
}

impl SourceResolver {
    pub fn new(
        fetcher: Arc<dyn WebFetcher>,
        lookup: Arc<dyn PlacesLookup>,
        options: ResolverOptions,
    ) -> Self {
        let media = MediaAcquirer::new(lookup.clone(), fetcher.clone(), options.image_timeout);
        Self {
            fetcher,
            lookup,
            media,
            options,
        }
    }

    /// Canonical form of `url`: short links are expanded, others returned as-is.
    ///
    /// The expansion response is handed back so the page need not be fetched twice.
    pub async fn canonicalize(&self, url: &str) -> (String, Option<WebResponse>) {
        if !is_short_link(url) {
            return (url.to_string(), None);
        }

        match self.fetcher.get(url, self.options.lookup_timeout).await {
            Ok(response) => {
                debug!(url = %url, expanded = %response.url, "Expanded short link");
                (response.url.clone(), Some(response))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Short link expansion failed");
                (url.to_string(), None)
            }
        }
    }

    pub async fn resolve(&self, url: &str) -> Result<ResolvedPlaceInfo, ResolveError> {
        let (canonical_url, expanded) = self.canonicalize(url).await;
        self.resolve_canonical(canonical_url, expanded).await
    }

    /// Resolve an already canonicalized URL, reusing the expansion response as
    /// the page when there is one.
    pub async fn resolve_canonical(
        &self,
        canonical_url: String,
        expanded: Option<WebResponse>,
    ) -> Result<ResolvedPlaceInfo, ResolveError> {
        let url_name = name_from_url(&canonical_url);

        let page = match expanded {
            Some(response) => Some(response),
            None => match self.fetcher.get(&canonical_url, self.options.lookup_timeout).await {
                Ok(response) => Some(response),
                Err(e) => {
                    warn!(url = %canonical_url, error = %e, "Page scrape failed");
                    None
                }
            },
        };
        let scraped = page.filter(|p| p.is_success()).map(|p| PageMeta::parse(&p.text()));

        let inferred_name = url_name
            .or_else(|| scraped.as_ref().and_then(|m| m.og_title.clone()))
            .or_else(|| scraped.as_ref().and_then(|m| m.title.clone()));

        let structured = match &inferred_name {
            Some(query) => self.lookup_place(query).await,
            None => None,
        };

        if scraped.is_none() && structured.is_none() {
            warn!(url = %canonical_url, "No data source produced anything usable");
            return Err(ResolveError::NoUsableSource { url: canonical_url });
        }

        let meta = scraped.unwrap_or_default();
        let context_text = match &structured {
            Some(place) => self.api_context(place, &canonical_url),
            None => scrape_context(&canonical_url, &meta),
        };

        let mut images = Vec::new();
        if let Some(og_image) = &meta.og_image {
            if let Some(image) = self.download_image(og_image).await {
                images.push(image);
            }
        }
        if self.options.image_analysis {
            if let Some(place) = &structured {
                let refs: Vec<&str> = place.photos.iter().map(|p| p.name.as_str()).collect();
                images.extend(
                    self.media
                        .fetch_provider_photos(&refs, self.options.max_provider_photos)
                        .await,
                );
            }
        }

        info!(
            url = %canonical_url,
            name = ?inferred_name,
            has_api_data = structured.is_some(),
            image_count = images.len(),
            "Resolved place source"
        );

        Ok(ResolvedPlaceInfo {
            canonical_url,
            inferred_name,
            structured,
            scraped_title: meta.title,
            og_title: meta.og_title,
            images,
            context_text,
        })
    }

    /// Look up coordinates for a name extracted from an image.
    pub async fn geocode(&self, name: &str, address: Option<&str>) -> Option<GeocodeHit> {
        let query = match address.map(str::trim).filter(|a| !a.is_empty()) {
            Some(address) => format!("{} {}", name.trim(), address),
            None => name.trim().to_string(),
        };
        if query.is_empty() {
            return None;
        }

        let place = self.lookup_place(&query).await?;
        let location = place.location?;
        Some(GeocodeHit {
            location: location.into(),
            formatted_address: place.formatted_address,
        })
    }

    async fn lookup_place(&self, query: &str) -> Option<Place> {
        match self.lookup.search(query).await {
            Ok(Some(place)) => Some(place),
            Ok(None) => {
                debug!(query = %query, "Places lookup returned no candidates");
                None
            }
            Err(PlacesError::Config(_)) => {
                debug!("Places lookup not configured, continuing scrape-only");
                None
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Places lookup failed");
                None
            }
        }
    }

    async fn download_image(&self, url: &str) -> Option<ImageBlob> {
        match self.fetcher.get(url, self.options.image_timeout).await {
            Ok(response) if response.status == 200 => Some(response.into_image()),
            Ok(response) => {
                debug!(url = %url, status = response.status, "og:image download rejected");
                None
            }
            Err(e) => {
                debug!(url = %url, error = %e, "og:image download failed");
                None
            }
        }
    }

    fn api_context(&self, place: &Place, url: &str) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "{}", API_SOURCE_MARKER);
        if let Some(name) = place.display_name_text() {
            let _ = writeln!(text, "Name: {}", name);
        }
        if let Some(address) = &place.formatted_address {
            let _ = writeln!(text, "Address: {}", address);
        }
        if !place.types.is_empty() {
            let _ = writeln!(text, "Types: {}", place.types.join(", "));
        }
        match (place.rating, place.user_rating_count) {
            (Some(rating), Some(count)) => {
                let _ = writeln!(text, "Rating: {} ({} reviews)", rating, count);
            }
            (Some(rating), None) => {
                let _ = writeln!(text, "Rating: {}", rating);
            }
            _ => {}
        }
        if let Some(price) = &place.price_level {
            let _ = writeln!(text, "Price level: {}", price);
        }
        let hours = place.weekday_descriptions();
        if !hours.is_empty() {
            let _ = writeln!(text, "Opening hours:");
            for line in hours {
                let _ = writeln!(text, "  {}", line);
            }
        }

        let reviews: Vec<String> = place
            .review_texts()
            .take(self.options.max_reviews)
            .map(|r| excerpt(r, self.options.review_excerpt_chars))
            .collect();
        if !reviews.is_empty() {
            let _ = writeln!(text, "Reviews:");
            for review in reviews {
                let _ = writeln!(text, "- {}", review);
            }
        }
        let _ = write!(text, "URL: {}", url);
        text
    }
}

fn scrape_context(url: &str, meta: &PageMeta) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "{}", SCRAPE_SOURCE_MARKER);
    let _ = writeln!(text, "URL: {}", url);
    if let Some(title) = &meta.title {
        let _ = writeln!(text, "Title: {}", title);
    }
    if let Some(og_title) = &meta.og_title {
        let _ = writeln!(text, "OG title: {}", og_title);
    }
    text.trim_end().to_string()
}

/// First `max_chars` characters, with an ellipsis when cut.
fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{}...", cut)
}
