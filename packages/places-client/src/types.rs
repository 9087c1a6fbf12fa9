use serde::{Deserialize, Serialize};

/// Body for `places:searchText`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextRequest {
    pub text_query: String,
}

/// Response of `places:searchText`. Empty object when nothing matched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchTextResponse {
    #[serde(default)]
    pub places: Vec<Place>,
}

/// A place candidate. Only fields named in the field mask are populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Resource name, `places/{place_id}`
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<LocalizedText>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_rating_count: Option<u32>,
    /// e.g. `PRICE_LEVEL_MODERATE`
    #[serde(default)]
    pub price_level: Option<String>,
    #[serde(default)]
    pub current_opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub location: Option<LatLng>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl Place {
    pub fn display_name_text(&self) -> Option<&str> {
        self.display_name
            .as_ref()
            .map(|d| d.text.as_str())
            .filter(|t| !t.is_empty())
    }

    pub fn weekday_descriptions(&self) -> &[String] {
        self.current_opening_hours
            .as_ref()
            .map(|h| h.weekday_descriptions.as_slice())
            .unwrap_or_default()
    }

    /// Non-empty review bodies, in API order.
    pub fn review_texts(&self) -> impl Iterator<Item = &str> {
        self.reviews
            .iter()
            .filter_map(|r| r.text.as_ref())
            .map(|t| t.text.as_str())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    #[serde(default)]
    pub open_now: Option<bool>,
    #[serde(default)]
    pub weekday_descriptions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub text: Option<LocalizedText>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Resource name, `places/{place_id}/photos/{photo_id}`
    pub name: String,
    #[serde(default)]
    pub width_px: Option<u32>,
    #[serde(default)]
    pub height_px: Option<u32>,
}

/// Response of `{photo}/media?skipHttpRedirect=true`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMedia {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photo_uri: Option<String>,
}

/// Fields requested through `X-Goog-FieldMask`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMask {
    fields: Vec<&'static str>,
}

impl FieldMask {
    /// Identity, address, classification, rating, price, hours and location.
    pub fn basic() -> Self {
        Self {
            fields: vec![
                "places.name",
                "places.displayName",
                "places.formattedAddress",
                "places.types",
                "places.rating",
                "places.userRatingCount",
                "places.priceLevel",
                "places.currentOpeningHours",
                "places.location",
            ],
        }
    }

    pub fn with_reviews(mut self) -> Self {
        self.fields.push("places.reviews");
        self
    }

    pub fn with_photos(mut self) -> Self {
        self.fields.push("places.photos");
        self
    }

    pub fn header_value(&self) -> String {
        self.fields.join(",")
    }
}

impl Default for FieldMask {
    fn default() -> Self {
        Self::basic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_mask_extensions() {
        let mask = FieldMask::basic().with_reviews().with_photos();
        let header = mask.header_value();

        assert!(header.starts_with("places.name,places.displayName"));
        assert!(header.ends_with("places.reviews,places.photos"));
        assert!(!FieldMask::basic().header_value().contains("photos"));
    }

    #[test]
    fn test_place_deserializes_partial_payload() {
        let body = r#"{
            "places": [{
                "name": "places/abc",
                "displayName": {"text": "Test Cafe", "languageCode": "en"},
                "types": ["cafe", "food"],
                "rating": 4.6,
                "userRatingCount": 120,
                "currentOpeningHours": {"weekdayDescriptions": ["Monday: 7:00 AM – 10:00 PM"]},
                "location": {"latitude": 10.77, "longitude": 106.70},
                "reviews": [{"text": {"text": "Lovely"}}, {"rating": 3}],
                "photos": [{"name": "places/abc/photos/p1", "widthPx": 800}]
            }]
        }"#;
        let response: SearchTextResponse = serde_json::from_str(body).unwrap();
        let place = &response.places[0];

        assert_eq!(place.display_name_text(), Some("Test Cafe"));
        assert_eq!(place.weekday_descriptions().len(), 1);
        assert_eq!(place.review_texts().collect::<Vec<_>>(), vec!["Lovely"]);
        assert_eq!(place.photos[0].name, "places/abc/photos/p1");
        assert!(place.formatted_address.is_none());
    }

    #[test]
    fn test_empty_search_response() {
        let response: SearchTextResponse = serde_json::from_str("{}").unwrap();
        assert!(response.places.is_empty());
    }
}
