//! End-to-end ingestion against mock collaborators.

mod common;

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use common::{harness, place, PLACE_PAGE, PLACE_URL, SHORT_URL};
use locbook::resolver::ResolverOptions;
use locbook::testing::{
    MemoryImageStore, MockAnalyzer, MockAnalyzerCall, MockPlacesLookup, MockWebFetcher,
};
use locbook::{
    Config, EnrichmentEngine, EnrichmentError, ErrorCategory, GeoPoint, Identity, IngestError,
    IngestOutcome, IngestPipeline, MemoryStore, PlaceRecord, PlaceStore, RawInput, SearchQuery,
    SourceResolver, StoreError,
};

const USER: Identity = Identity(1001);

fn cafe_payload() -> serde_json::Value {
    json!({
        "details": {
            "name": "Test Cafe",
            "categories": [],
            "meal_types": ["Breakfast"],
            "occasions": ["Work"],
            "vibes": ["cozy", "bright"],
            "rating": 4.5
        },
        "commentary": "Sunny corner, strong coffee."
    })
}

#[tokio::test]
async fn scrape_only_link_is_saved_with_merged_categories() {
    let h = harness(
        Config::default(),
        MockWebFetcher::new().with_page(PLACE_URL, PLACE_PAGE),
        MockPlacesLookup::unconfigured(),
        MockAnalyzer::new().with_payload(cafe_payload()),
    );

    let outcome = h.kernel.handle_link(USER, PLACE_URL).await.unwrap();

    let IngestOutcome::Created { record, commentary } = outcome else {
        panic!("expected a new record");
    };
    assert_eq!(record.name, "Test Cafe");
    assert_eq!(record.source_url.as_deref(), Some(PLACE_URL));
    assert!(!record.categories.is_empty());
    let categories: HashSet<&str> = record.categories.iter().map(String::as_str).collect();
    assert_eq!(categories, HashSet::from(["Breakfast", "Work"]));
    assert_eq!(record.meal_types, vec!["Breakfast"]);
    assert_eq!(record.occasions, vec!["Work"]);
    assert_eq!(commentary, "Sunny corner, strong coffee.");
    assert!(record.raw_enrichment.is_some());

    match &h.analyzer.calls()[0] {
        MockAnalyzerCall::AnalyzePlaceComplex { text, .. } => {
            assert!(text.contains("low confidence"));
        }
        other => panic!("unexpected first call {:?}", other),
    }
}

#[tokio::test]
async fn same_canonical_url_is_saved_once() {
    let h = harness(
        Config::default(),
        MockWebFetcher::new().with_redirect(SHORT_URL, PLACE_URL, PLACE_PAGE),
        MockPlacesLookup::new().with_place(place("Test Cafe", 10.7769, 106.7009)),
        MockAnalyzer::new().with_payload(cafe_payload()),
    );

    let first = h.kernel.handle_link(USER, SHORT_URL).await.unwrap();
    let lookups = h.lookup.searches().len();
    let fetches = h.fetcher.calls();

    let second = h.kernel.handle_link(USER, PLACE_URL).await.unwrap();
    let third = h.kernel.handle_link(USER, SHORT_URL).await.unwrap();

    assert!(!first.is_duplicate());
    assert!(second.is_duplicate());
    assert!(third.is_duplicate());
    assert_eq!(second.record().id, first.record().id);
    assert_eq!(third.record().id, first.record().id);
    assert_eq!(h.store.count().await.unwrap(), 1);

    // A saved short link costs one expansion request and nothing more.
    assert_eq!(h.lookup.searches().len(), lookups);
    let mut expected = fetches;
    expected.push(SHORT_URL.to_string());
    assert_eq!(h.fetcher.calls(), expected);

    let analyses = h
        .analyzer
        .calls()
        .iter()
        .filter(|c| matches!(c, MockAnalyzerCall::AnalyzePlaceComplex { .. }))
        .count();
    assert_eq!(analyses, 1);
}

#[tokio::test]
async fn api_data_supplies_location_and_address() {
    let payload = json!({"details": {"name": "Test Cafe", "categories": ["Cafe"]}, "commentary": "ok"});
    let h = harness(
        Config::default(),
        MockWebFetcher::new()
            .with_page(PLACE_URL, PLACE_PAGE)
            .with_image("https://lh5.googleusercontent.com/p/test-cafe", b"og", "image/jpeg"),
        MockPlacesLookup::new().with_place(place("Test Cafe", 10.7769, 106.7009)),
        MockAnalyzer::new().with_payload(payload),
    );

    let outcome = h.kernel.handle_link(USER, PLACE_URL).await.unwrap();

    let record = outcome.record();
    assert_eq!(record.location, Some(GeoPoint::new(10.7769, 106.7009)));
    assert_eq!(
        record.address.as_deref(),
        Some("12 Nguyen Hue, District 1, Ho Chi Minh City")
    );
    match &h.analyzer.calls()[0] {
        MockAnalyzerCall::AnalyzePlaceComplex { text, image_count } => {
            assert_eq!(*image_count, 1);
            assert!(!text.contains("low confidence"));
        }
        other => panic!("unexpected first call {:?}", other),
    }
}

#[tokio::test]
async fn enrichment_failure_saves_nothing() {
    let h = harness(
        Config::default(),
        MockWebFetcher::new().with_page(PLACE_URL, PLACE_PAGE),
        MockPlacesLookup::unconfigured(),
        MockAnalyzer::new().with_error(EnrichmentError::RateLimited),
    );

    let err = h.kernel.handle_link(USER, PLACE_URL).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::RateLimited);
    assert!(err.is_retryable());
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn parse_failure_is_not_retryable() {
    let h = harness(
        Config::default(),
        MockWebFetcher::new().with_page(PLACE_URL, PLACE_PAGE),
        MockPlacesLookup::unconfigured(),
        MockAnalyzer::new().with_error(EnrichmentError::ParseFailure),
    );

    let err = h.kernel.handle_link(USER, PLACE_URL).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::ParseFailure);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn unreachable_link_is_resolve_failure() {
    let h = harness(
        Config::default(),
        MockWebFetcher::new(),
        MockPlacesLookup::unconfigured(),
        MockAnalyzer::new().with_payload(cafe_payload()),
    );

    let err = h.kernel.handle_link(USER, PLACE_URL).await.unwrap_err();

    assert!(matches!(err, IngestError::Resolve(_)));
    assert_eq!(err.category(), ErrorCategory::ResolveFailed);
    assert!(h.analyzer.calls().is_empty());
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_name_is_validation_failure() {
    let url = "https://www.google.com/maps/@10.77,106.70,15z";
    let h = harness(
        Config::default(),
        MockWebFetcher::new().with_page(url, "<html><body>map</body></html>"),
        MockPlacesLookup::unconfigured(),
        MockAnalyzer::new().with_payload(json!({"details": {"categories": ["Cafe"]}})),
    );

    let err = h.kernel.handle_link(USER, url).await.unwrap_err();

    assert!(matches!(err, IngestError::Validation { field: "name" }));
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_commentary_is_generated_separately() {
    let h = harness(
        Config::default(),
        MockWebFetcher::new().with_page(PLACE_URL, PLACE_PAGE),
        MockPlacesLookup::unconfigured(),
        MockAnalyzer::new()
            .with_payload(json!({"details": {"name": "Test Cafe"}}))
            .with_commentary("Worth the detour."),
    );

    let outcome = h.kernel.handle_link(USER, PLACE_URL).await.unwrap();

    let IngestOutcome::Created { commentary, .. } = outcome else {
        panic!("expected a new record");
    };
    assert_eq!(commentary, "Worth the detour.");
    assert!(h.analyzer.calls().contains(&MockAnalyzerCall::GenerateCommentary {
        name: Some("Test Cafe".to_string())
    }));
}

#[tokio::test]
async fn screenshot_is_geocoded_and_stored() {
    let payload = json!({"details": {"name": "Test Cafe", "categories": ["Cafe"]}, "commentary": "ok"});
    let h = harness(
        Config::default(),
        MockWebFetcher::new(),
        MockPlacesLookup::new().with_place(place("Test Cafe", 10.7769, 106.7009)),
        MockAnalyzer::new().with_payload(payload),
    );

    let outcome = h
        .kernel
        .handle_photo(USER, b"jpeg-bytes".to_vec(), chrono::Utc::now())
        .await
        .unwrap();

    let locbook::Reply::Saved(outcome) = outcome else {
        panic!("expected a saved record");
    };
    let record = outcome.record();
    assert_eq!(record.location, Some(GeoPoint::new(10.7769, 106.7009)));
    assert!(record.address.is_some());
    assert!(record.source_url.is_none());

    let path = record.source_image.clone().unwrap();
    assert!(path.starts_with("screenshots/"));
    assert_eq!(h.images.get(&path), Some(b"jpeg-bytes".to_vec()));
    assert_eq!(h.lookup.searches(), vec!["Test Cafe".to_string()]);
}

#[tokio::test]
async fn unnamed_screenshot_stores_nothing() {
    let h = harness(
        Config::default(),
        MockWebFetcher::new(),
        MockPlacesLookup::new(),
        MockAnalyzer::new().with_payload(json!({"details": {"vibes": ["blurry"]}})),
    );

    let err = h
        .kernel
        .handle_photo(USER, b"jpeg-bytes".to_vec(), chrono::Utc::now())
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::ValidationFailure);
    assert!(h.images.is_empty());
    assert_eq!(h.store.count().await.unwrap(), 0);
}

// =============================================================================
// Pipeline entry point and cleanup
// =============================================================================

/// Memory store whose inserts always fail.
struct RejectingStore(MemoryStore);

#[async_trait]
impl PlaceStore for RejectingStore {
    async fn insert(&self, _record: PlaceRecord) -> Result<PlaceRecord, StoreError> {
        Err(StoreError::Backend("disk full".into()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<PlaceRecord>, StoreError> {
        self.0.get(id).await
    }

    async fn find_by_source_url(&self, url: &str) -> Result<Option<PlaceRecord>, StoreError> {
        self.0.find_by_source_url(url).await
    }

    async fn update(&self, record: &PlaceRecord) -> Result<(), StoreError> {
        self.0.update(record).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.0.delete(id).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.0.count().await
    }

    async fn list(&self) -> Result<Vec<PlaceRecord>, StoreError> {
        self.0.list().await
    }

    async fn category_frequencies(&self) -> Result<Vec<(String, usize)>, StoreError> {
        self.0.category_frequencies().await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlaceRecord>, StoreError> {
        self.0.search(query).await
    }
}

fn pipeline(
    fetcher: MockWebFetcher,
    lookup: MockPlacesLookup,
    analyzer: MockAnalyzer,
    store: Arc<dyn PlaceStore>,
    images: Arc<MemoryImageStore>,
) -> IngestPipeline {
    let resolver = SourceResolver::new(
        Arc::new(fetcher),
        Arc::new(lookup),
        ResolverOptions::default(),
    );
    IngestPipeline::new(
        Arc::new(resolver),
        EnrichmentEngine::new(Arc::new(analyzer)),
        store,
        images,
    )
}

#[tokio::test]
async fn raw_inputs_of_both_kinds_are_ingested() {
    let store = Arc::new(MemoryStore::new());
    let images = Arc::new(MemoryImageStore::new());
    let pipeline = pipeline(
        MockWebFetcher::new().with_page(PLACE_URL, PLACE_PAGE),
        MockPlacesLookup::unconfigured(),
        MockAnalyzer::new().with_payload(cafe_payload()),
        store.clone(),
        images.clone(),
    );

    let link = pipeline.ingest(RawInput::link(PLACE_URL, USER)).await.unwrap();
    let photo = pipeline
        .ingest(RawInput::image(b"jpeg-bytes".to_vec(), USER))
        .await
        .unwrap();

    assert_eq!(link.record().source_url.as_deref(), Some(PLACE_URL));
    assert!(photo.record().source_image.is_some());
    assert_eq!(store.count().await.unwrap(), 2);
    assert_eq!(images.len(), 1);
}

#[tokio::test]
async fn failed_insert_removes_saved_screenshot() {
    let images = Arc::new(MemoryImageStore::new());
    let pipeline = pipeline(
        MockWebFetcher::new(),
        MockPlacesLookup::new(),
        MockAnalyzer::new().with_payload(cafe_payload()),
        Arc::new(RejectingStore(MemoryStore::new())),
        images.clone(),
    );

    let err = pipeline
        .ingest(RawInput::image(b"jpeg-bytes".to_vec(), USER))
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Storage(_)));
    assert!(images.is_empty());
}
