//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use locbook::testing::{MemoryImageStore, MockAnalyzer, MockPlacesLookup, MockWebFetcher};
use locbook::{Config, Dependencies, EnrichmentEngine, LocBook, MemoryStore};
use places_client::{LatLng, LocalizedText, Place};

pub const SHORT_URL: &str = "https://maps.app.goo.gl/AbCd123";
pub const PLACE_URL: &str = "https://www.google.com/maps/place/Test+Cafe/@10.7769,106.7009,17z";
pub const PLACE_PAGE: &str = r#"<html><head>
    <title>Test Cafe - Google Maps</title>
    <meta property="og:title" content="Test Cafe">
    <meta property="og:image" content="https://lh5.googleusercontent.com/p/test-cafe">
</head><body></body></html>"#;

pub struct Harness {
    pub kernel: LocBook,
    pub fetcher: Arc<MockWebFetcher>,
    pub lookup: Arc<MockPlacesLookup>,
    pub analyzer: Arc<MockAnalyzer>,
    pub store: Arc<MemoryStore>,
    pub images: Arc<MemoryImageStore>,
}

pub fn harness(
    config: Config,
    fetcher: MockWebFetcher,
    lookup: MockPlacesLookup,
    analyzer: MockAnalyzer,
) -> Harness {
    let fetcher = Arc::new(fetcher);
    let lookup = Arc::new(lookup);
    let analyzer = Arc::new(analyzer);
    let store = Arc::new(MemoryStore::new());
    let images = Arc::new(MemoryImageStore::new());

    let deps = Dependencies {
        fetcher: fetcher.clone(),
        lookup: lookup.clone(),
        engine: EnrichmentEngine::new(analyzer.clone()),
        store: store.clone(),
        images: images.clone(),
    };

    Harness {
        kernel: LocBook::new(config, deps),
        fetcher,
        lookup,
        analyzer,
        store,
        images,
    }
}

pub fn place(name: &str, latitude: f64, longitude: f64) -> Place {
    Place {
        display_name: Some(LocalizedText {
            text: name.to_string(),
            language_code: None,
        }),
        formatted_address: Some("12 Nguyen Hue, District 1, Ho Chi Minh City".to_string()),
        types: vec!["cafe".to_string()],
        rating: Some(4.6),
        user_rating_count: Some(812),
        location: Some(LatLng {
            latitude,
            longitude,
        }),
        ..Default::default()
    }
}
