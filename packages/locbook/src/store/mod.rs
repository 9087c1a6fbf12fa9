//! Persistence primitives the pipeline depends on.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::PlaceRecord;
use crate::types::GeoPoint;

/// Filters for a stored-place search.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Lowercased terms matched against name, categories and vibes
    pub terms: Vec<String>,
    pub min_rating: Option<f64>,
    /// When set, only located records are returned, nearest first
    pub near: Option<GeoPoint>,
    pub limit: usize,
}

#[async_trait]
pub trait PlaceStore: Send + Sync {
    async fn insert(&self, record: PlaceRecord) -> Result<PlaceRecord, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<PlaceRecord>, StoreError>;

    /// Exact match on the canonical source URL.
    async fn find_by_source_url(&self, url: &str) -> Result<Option<PlaceRecord>, StoreError>;

    /// Replace a stored record. Fails with `NotFound` if it does not exist.
    async fn update(&self, record: &PlaceRecord) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    async fn list(&self) -> Result<Vec<PlaceRecord>, StoreError>;

    /// Category → record count, most frequent first.
    async fn category_frequencies(&self) -> Result<Vec<(String, usize)>, StoreError>;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlaceRecord>, StoreError>;
}
