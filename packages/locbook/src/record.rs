//! Persisted place record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::enrichment::PlaceDetails;
use crate::types::GeoPoint;

/// Version of the derived-field layout. Records below it are legacy.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,

    /// Union of detail categories, meal types and occasions
    pub categories: Vec<String>,
    pub meal_types: Vec<String>,
    pub occasions: Vec<String>,

    pub vibes: Vec<String>,
    pub mood: Vec<String>,
    pub aesthetic_score: Option<f64>,
    pub lighting: Option<String>,
    pub rating: Option<f64>,
    pub price_level: Option<String>,
    pub status: Option<String>,
    pub opening_hours: Option<String>,
    pub popular_times: Option<String>,
    pub noise_level: Option<String>,
    pub crowd_type: Option<String>,
    pub amenities: Vec<String>,
    pub best_time_to_visit: Option<String>,

    /// Canonical URL; the dedup key for link submissions
    pub source_url: Option<String>,
    /// Relative path of a submitted screenshot
    pub source_image: Option<String>,
    pub location: Option<GeoPoint>,

    /// Decoded enrichment payload, kept for re-derivation
    pub raw_enrichment: Option<Value>,
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
}

impl PlaceRecord {
    pub fn new(name: impl Into<String>, details: &PlaceDetails, raw: Value) -> Self {
        let mut record = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: details.address.clone(),
            categories: Vec::new(),
            meal_types: Vec::new(),
            occasions: Vec::new(),
            vibes: Vec::new(),
            mood: Vec::new(),
            aesthetic_score: None,
            lighting: None,
            rating: None,
            price_level: None,
            status: None,
            opening_hours: None,
            popular_times: None,
            noise_level: None,
            crowd_type: None,
            amenities: Vec::new(),
            best_time_to_visit: None,
            source_url: None,
            source_image: None,
            location: None,
            raw_enrichment: Some(raw),
            schema_version: CURRENT_SCHEMA_VERSION,
            created_at: Utc::now(),
        };
        record.apply_details(details);
        record
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_source_image(mut self, path: impl Into<String>) -> Self {
        self.source_image = Some(path.into());
        self
    }

    pub fn with_location(mut self, location: Option<GeoPoint>) -> Self {
        self.location = location;
        self
    }

    /// Overwrite every derived field from `details`. Name and address are
    /// left alone.
    pub fn apply_details(&mut self, details: &PlaceDetails) {
        self.categories =
            merge_categories(&details.categories, &details.meal_types, &details.occasions);
        self.meal_types = details.meal_types.clone();
        self.occasions = details.occasions.clone();
        self.vibes = details.vibes.clone();
        self.mood = details.mood.clone();
        self.aesthetic_score = details.aesthetic_score;
        self.lighting = details.lighting.clone();
        self.rating = details.rating;
        self.price_level = details.price_level.clone();
        self.status = details.status.clone();
        self.opening_hours = details.opening_hours.clone();
        self.popular_times = details.popular_times.clone();
        self.noise_level = details.noise_level.clone();
        self.crowd_type = details.crowd_type.clone();
        self.amenities = details.amenities.clone();
        self.best_time_to_visit = details.best_time_to_visit.clone();
    }

    pub fn is_legacy(&self) -> bool {
        self.schema_version < CURRENT_SCHEMA_VERSION
    }
}

/// Exact set union of the three tag lists, first occurrence kept.
///
/// Blank tags are dropped; everything else is compared as-is.
pub fn merge_categories(categories: &[String], meal_types: &[String], occasions: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for tag in categories.iter().chain(meal_types).chain(occasions) {
        if tag.trim().is_empty() || merged.contains(tag) {
            continue;
        }
        merged.push(tag.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_category_union() {
        let details = PlaceDetails {
            categories: tags(&["Cafe"]),
            meal_types: tags(&["Breakfast"]),
            occasions: tags(&["Work"]),
            ..Default::default()
        };

        let record = PlaceRecord::new("Test Cafe", &details, json!({}));

        let got: HashSet<&str> = record.categories.iter().map(String::as_str).collect();
        assert_eq!(got, HashSet::from(["Cafe", "Breakfast", "Work"]));
        assert_eq!(record.categories.len(), 3);
        assert_eq!(record.meal_types, tags(&["Breakfast"]));
        assert_eq!(record.occasions, tags(&["Work"]));
    }

    #[test]
    fn test_merge_removes_exact_duplicates() {
        let merged = merge_categories(
            &tags(&["Cafe", "Workspace"]),
            &tags(&["Brunch", "Cafe"]),
            &tags(&["Workspace", " ", "Date"]),
        );
        assert_eq!(merged, tags(&["Cafe", "Workspace", "Brunch", "Date"]));
    }

    #[test]
    fn test_merge_is_case_sensitive() {
        let details = PlaceDetails {
            categories: tags(&["Bar"]),
            meal_types: tags(&["bar"]),
            occasions: tags(&["Work"]),
            ..Default::default()
        };

        let record = PlaceRecord::new("Late Bar", &details, json!({}));

        assert_eq!(record.categories, tags(&["Bar", "bar", "Work"]));
        for tag in record.meal_types.iter().chain(&record.occasions) {
            assert!(record.categories.contains(tag), "{} missing from categories", tag);
        }
    }

    #[test]
    fn test_new_record_is_current() {
        let record = PlaceRecord::new("Test Cafe", &PlaceDetails::default(), json!({"details": {}}))
            .with_source_url("https://maps.example/place/1");

        assert!(!record.is_legacy());
        assert!(record.raw_enrichment.is_some());
        assert_eq!(record.source_url.as_deref(), Some("https://maps.example/place/1"));
    }
}
