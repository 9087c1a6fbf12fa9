//! Enrichment result types.
//!
//! Deserialization is lenient: the local backend does not enforce a schema, so
//! lists may arrive as comma-separated strings and numbers as strings.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::EnrichmentError;

/// Structured attributes extracted for a place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlaceDetails {
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub address: Option<String>,

    /// Short type tags, e.g. "Cafe", "Workspace"
    #[serde(default, deserialize_with = "string_or_list")]
    #[schemars(with = "Vec<String>")]
    pub categories: Vec<String>,

    /// Breakfast, Brunch, Lunch, Dinner, Late night
    #[serde(default, alias = "mealTypes", deserialize_with = "string_or_list")]
    #[schemars(with = "Vec<String>")]
    pub meal_types: Vec<String>,

    /// Work, Date, Group, Solo, Family
    #[serde(default, deserialize_with = "string_or_list")]
    #[schemars(with = "Vec<String>")]
    pub occasions: Vec<String>,

    #[serde(default, deserialize_with = "string_or_list")]
    #[schemars(with = "Vec<String>")]
    pub vibes: Vec<String>,

    #[serde(default, deserialize_with = "string_or_list")]
    #[schemars(with = "Vec<String>")]
    pub mood: Vec<String>,

    /// 1 to 10
    #[serde(default, alias = "aestheticScore", deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<f64>")]
    pub aesthetic_score: Option<f64>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub lighting: Option<String>,

    /// 0 to 5
    #[serde(default, deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<f64>")]
    pub rating: Option<f64>,

    #[serde(default, alias = "priceLevel", deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub price_level: Option<String>,

    /// Operating status, e.g. "Open", "Temporarily closed"
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub status: Option<String>,

    #[serde(default, alias = "openingHours", deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub opening_hours: Option<String>,

    #[serde(default, alias = "popularTimes", deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub popular_times: Option<String>,

    #[serde(default, alias = "noiseLevel", deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub noise_level: Option<String>,

    #[serde(default, alias = "crowdType", deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub crowd_type: Option<String>,

    #[serde(default, deserialize_with = "string_or_list")]
    #[schemars(with = "Vec<String>")]
    pub amenities: Vec<String>,

    #[serde(default, alias = "bestTimeToVisit", deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub best_time_to_visit: Option<String>,
}

/// Shape requested from the backend: details plus commentary.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AnalysisEnvelope {
    pub details: PlaceDetails,
    /// Short, friendly take on the place
    #[serde(default)]
    pub commentary: String,
}

/// Decoded enrichment output.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceAnalysis {
    pub details: PlaceDetails,
    pub commentary: String,
    /// Full decoded payload, kept for re-derivation
    pub raw: Value,
}

impl PlaceAnalysis {
    /// Interpret a decoded payload.
    ///
    /// A payload without a `details` object is taken to be the details itself.
    pub fn from_value(raw: Value) -> Result<Self, EnrichmentError> {
        let Value::Object(map) = &raw else {
            return Err(EnrichmentError::ParseFailure);
        };

        let details_value = match map.get("details") {
            Some(details @ Value::Object(_)) => details.clone(),
            _ => raw.clone(),
        };
        let details: PlaceDetails =
            serde_json::from_value(details_value).map_err(|_| EnrichmentError::ParseFailure)?;

        let commentary = map
            .get("commentary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Self {
            details,
            commentary,
            raw,
        })
    }
}

/// Structured filters parsed from a free-text search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchIntent {
    /// Text to match against name and category
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub keywords: Option<String>,

    #[serde(default, deserialize_with = "string_or_list")]
    #[schemars(with = "Vec<String>")]
    pub vibes: Vec<String>,

    #[serde(default, alias = "minRating", deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<f64>")]
    pub min_rating: Option<f64>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub city: Option<String>,

    /// True when the request is relative to the user's position ("near me")
    #[serde(default, alias = "locationNeeded", deserialize_with = "lenient_bool")]
    #[schemars(with = "bool")]
    pub location_needed: bool,
}

impl SearchIntent {
    /// Individual search terms, lowercased.
    pub fn terms(&self) -> Vec<String> {
        self.keywords
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c.is_whitespace() || c == ',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Minimum rating, with zero meaning "no filter".
    pub fn rating_floor(&self) -> Option<f64> {
        self.min_rating.filter(|r| *r > 0.0)
    }
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items: Vec<String> = match value {
        Some(Value::Array(items)) => items.into_iter().filter_map(scalar_to_string).collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items.into_iter().filter_map(scalar_to_string).collect();
            Some(parts.join(", "))
        }
        Some(other) => scalar_to_string(other),
        None => None,
    };
    Ok(text
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
        _ => false,
    })
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_with_envelope() {
        let raw = json!({
            "details": {
                "name": "Test Cafe",
                "categories": ["Cafe"],
                "meal_types": ["Breakfast"],
                "occasions": ["Work"],
                "rating": 4.5
            },
            "commentary": "  Cozy corner with great coffee.  "
        });

        let analysis = PlaceAnalysis::from_value(raw.clone()).unwrap();

        assert_eq!(analysis.details.name.as_deref(), Some("Test Cafe"));
        assert_eq!(analysis.details.meal_types, vec!["Breakfast"]);
        assert_eq!(analysis.details.rating, Some(4.5));
        assert_eq!(analysis.commentary, "Cozy corner with great coffee.");
        assert_eq!(analysis.raw, raw);
    }

    #[test]
    fn test_from_value_bare_details() {
        let analysis = PlaceAnalysis::from_value(json!({"name": "Bare Bar", "vibes": "dim, loud"})).unwrap();
        assert_eq!(analysis.details.name.as_deref(), Some("Bare Bar"));
        assert_eq!(analysis.details.vibes, vec!["dim", "loud"]);
        assert!(analysis.commentary.is_empty());
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert_eq!(
            PlaceAnalysis::from_value(json!(["not", "an", "object"])),
            Err(EnrichmentError::ParseFailure)
        );
    }

    #[test]
    fn test_lenient_fields() {
        let details: PlaceDetails = serde_json::from_value(json!({
            "name": "  ",
            "mealTypes": ["Lunch", "", 3],
            "aesthetic_score": "8",
            "rating": null,
            "opening_hours": ["Mon: 7-22", "Tue: 7-22"],
            "amenities": null
        }))
        .unwrap();

        assert_eq!(details.name, None);
        assert_eq!(details.meal_types, vec!["Lunch", "3"]);
        assert_eq!(details.aesthetic_score, Some(8.0));
        assert_eq!(details.rating, None);
        assert_eq!(details.opening_hours.as_deref(), Some("Mon: 7-22, Tue: 7-22"));
        assert!(details.amenities.is_empty());
    }

    #[test]
    fn test_search_intent_terms() {
        let intent: SearchIntent = serde_json::from_value(json!({
            "keywords": "Cafe, bánh mì",
            "min_rating": 0,
            "location_needed": "true"
        }))
        .unwrap();

        assert_eq!(intent.terms(), vec!["cafe", "bánh", "mì"]);
        assert_eq!(intent.rating_floor(), None);
        assert!(intent.location_needed);
    }
}
