//! In-memory place store for tests, the CLI and development.
//!
//! Data is lost on restart.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use super::{PlaceStore, SearchQuery};
use crate::error::StoreError;
use crate::record::PlaceRecord;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, PlaceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend("memory store lock poisoned".into())
}

/// Number of query terms found in the record's name, categories or vibes.
fn term_hits(record: &PlaceRecord, terms: &[String]) -> usize {
    let name = record.name.to_lowercase();
    let tags: Vec<String> = record
        .categories
        .iter()
        .chain(&record.vibes)
        .map(|t| t.to_lowercase())
        .collect();

    terms
        .iter()
        .filter(|term| name.contains(term.as_str()) || tags.iter().any(|t| t.contains(term.as_str())))
        .count()
}

#[async_trait]
impl PlaceStore for MemoryStore {
    async fn insert(&self, record: PlaceRecord) -> Result<PlaceRecord, StoreError> {
        self.records
            .write()
            .map_err(poisoned)?
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PlaceRecord>, StoreError> {
        Ok(self.records.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn find_by_source_url(&self, url: &str) -> Result<Option<PlaceRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .map_err(poisoned)?
            .values()
            .find(|r| r.source_url.as_deref() == Some(url))
            .cloned())
    }

    async fn update(&self, record: &PlaceRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                id: record.id.to_string(),
            }),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.records.write().map_err(poisoned)?.remove(&id).is_some())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().map_err(poisoned)?.len())
    }

    async fn list(&self) -> Result<Vec<PlaceRecord>, StoreError> {
        let mut records: Vec<PlaceRecord> =
            self.records.read().map_err(poisoned)?.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn category_frequencies(&self) -> Result<Vec<(String, usize)>, StoreError> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for record in self.records.read().map_err(poisoned)?.values() {
            for category in &record.categories {
                *counts.entry(category.clone()).or_default() += 1;
            }
        }

        let mut frequencies: Vec<(String, usize)> = counts.into_iter().collect();
        frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(frequencies)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlaceRecord>, StoreError> {
        let records = self.records.read().map_err(poisoned)?;

        let mut hits: Vec<(usize, &PlaceRecord)> = records
            .values()
            .filter(|r| match query.min_rating {
                Some(min) => r.rating.is_some_and(|rating| rating >= min),
                None => true,
            })
            .filter(|r| query.near.is_none() || r.location.is_some())
            .map(|r| (term_hits(r, &query.terms), r))
            .filter(|(hits, _)| query.terms.is_empty() || *hits > 0)
            .collect();

        match query.near {
            Some(origin) => hits.sort_by(|(_, a), (_, b)| {
                let da = a.location.map(|p| origin.distance_km(&p)).unwrap_or(f64::MAX);
                let db = b.location.map(|p| origin.distance_km(&p)).unwrap_or(f64::MAX);
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            }),
            None => hits.sort_by(|(ha, a), (hb, b)| {
                hb.cmp(ha).then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }

        let limit = if query.limit == 0 { usize::MAX } else { query.limit };
        Ok(hits.into_iter().take(limit).map(|(_, r)| r.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::PlaceDetails;
    use crate::types::GeoPoint;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn record(name: &str, categories: &[&str], rating: Option<f64>, age_minutes: i64) -> PlaceRecord {
        let details = PlaceDetails {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            rating,
            ..Default::default()
        };
        let mut record = PlaceRecord::new(name, &details, json!({}));
        record.created_at = Utc::now() - Duration::minutes(age_minutes);
        record
    }

    #[tokio::test]
    async fn test_crud() {
        let store = MemoryStore::new();
        let mut saved = store.insert(record("Test Cafe", &["Cafe"], None, 0)).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get(saved.id).await.unwrap().unwrap().name, "Test Cafe");

        saved.name = "Renamed Cafe".into();
        store.update(&saved).await.unwrap();
        assert_eq!(store.get(saved.id).await.unwrap().unwrap().name, "Renamed Cafe");

        assert!(store.delete(saved.id).await.unwrap());
        assert!(!store.delete(saved.id).await.unwrap());
        assert!(matches!(
            store.update(&saved).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_find_by_source_url_is_exact() {
        let store = MemoryStore::new();
        store
            .insert(record("A", &[], None, 0).with_source_url("https://maps.example/a"))
            .await
            .unwrap();

        assert!(store.find_by_source_url("https://maps.example/a").await.unwrap().is_some());
        assert!(store.find_by_source_url("https://maps.example/a/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_frequencies() {
        let store = MemoryStore::new();
        store.insert(record("A", &["Cafe", "Brunch"], None, 0)).await.unwrap();
        store.insert(record("B", &["Cafe"], None, 0)).await.unwrap();

        let frequencies = store.category_frequencies().await.unwrap();
        assert_eq!(frequencies[0], ("Cafe".to_string(), 2));
        assert_eq!(frequencies[1], ("Brunch".to_string(), 1));
    }

    #[tokio::test]
    async fn test_search_terms_and_rating() {
        let store = MemoryStore::new();
        store.insert(record("Morning Cafe", &["Cafe"], Some(4.7), 10)).await.unwrap();
        store.insert(record("Late Bar", &["Bar"], Some(4.9), 5)).await.unwrap();
        store.insert(record("Dull Cafe", &["Cafe"], Some(3.1), 1)).await.unwrap();

        let query = SearchQuery {
            terms: vec!["cafe".into()],
            min_rating: Some(4.0),
            limit: 3,
            ..Default::default()
        };
        let results = store.search(&query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Morning Cafe");
    }

    #[tokio::test]
    async fn test_search_without_terms_is_newest_first() {
        let store = MemoryStore::new();
        for (name, age) in [("Old", 30), ("Newest", 1), ("Middle", 10), ("Oldest", 60)] {
            store.insert(record(name, &[], None, age)).await.unwrap();
        }

        let query = SearchQuery {
            limit: 3,
            ..Default::default()
        };
        let names: Vec<String> = store
            .search(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, vec!["Newest", "Middle", "Old"]);
    }

    #[tokio::test]
    async fn test_search_near_orders_by_distance() {
        let store = MemoryStore::new();
        let far = record("Far Cafe", &["Cafe"], None, 0).with_location(Some(GeoPoint::new(21.03, 105.85)));
        let near = record("Near Cafe", &["Cafe"], None, 0).with_location(Some(GeoPoint::new(10.78, 106.70)));
        let nowhere = record("Unlocated Cafe", &["Cafe"], None, 0);
        for r in [far, near, nowhere] {
            store.insert(r).await.unwrap();
        }

        let query = SearchQuery {
            terms: vec!["cafe".into()],
            near: Some(GeoPoint::new(10.77, 106.70)),
            limit: 3,
            ..Default::default()
        };
        let names: Vec<String> = store
            .search(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, vec!["Near Cafe", "Far Cafe"]);
    }
}
