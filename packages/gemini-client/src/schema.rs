//! Type-safe schema generation for Gemini structured outputs.
//!
//! Uses the `schemars` crate to generate JSON schemas from Rust types, then
//! rewrites them into the OpenAPI subset that `responseSchema` accepts.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use gemini_client::StructuredOutput;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct SearchFilters {
//!     keywords: Option<String>,
//!     vibes: Vec<String>,
//! }
//!
//! let schema = SearchFilters::gemini_schema();
//! ```

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// `format` values the API accepts; anything else is dropped.
const SUPPORTED_FORMATS: &[&str] = &["float", "double", "int32", "int64", "enum", "date-time"];

/// Trait for types that can be used as Gemini structured output.
///
/// Automatically implemented for any type that implements `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate a Gemini-compatible response schema for this type.
    ///
    /// Gemini requires:
    /// 1. Upper-case type names (`OBJECT`, `STRING`, ...)
    /// 2. `nullable: true` instead of `["string", "null"]` unions
    /// 3. Fully inlined schemas (no `$ref`, no `definitions`)
    fn gemini_schema() -> Value {
        let schema = schema_for!(Self);
        let value = serde_json::to_value(schema).unwrap_or_default();
        gemini_compatible(&value)
    }

    /// Get the schema name for this type.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

// Blanket implementation for all types that satisfy the bounds
impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Rewrite a draft-07 schema (as produced by schemars) into Gemini's dialect.
pub fn gemini_compatible(schema: &Value) -> Value {
    let definitions = schema.get("definitions").cloned().unwrap_or(Value::Null);
    convert(schema, &definitions)
}

fn convert(value: &Value, definitions: &Value) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };

    // Inline references
    if let Some(Value::String(ref_path)) = map.get("$ref") {
        if let Some(def) = ref_path
            .strip_prefix("#/definitions/")
            .and_then(|name| definitions.get(name))
        {
            return with_description(convert(def, definitions), map.get("description"));
        }
    }

    // schemars wraps described refs in a single-element allOf
    if let Some(Value::Array(all_of)) = map.get("allOf") {
        if all_of.len() == 1 {
            return with_description(convert(&all_of[0], definitions), map.get("description"));
        }
    }

    // Option<Struct> becomes anyOf [X, null]
    if let Some(Value::Array(any_of)) = map.get("anyOf") {
        let non_null: Vec<&Value> = any_of
            .iter()
            .filter(|v| v.get("type").and_then(|t| t.as_str()) != Some("null"))
            .collect();
        if non_null.len() == 1 && non_null.len() < any_of.len() {
            let mut inner = with_description(convert(non_null[0], definitions), map.get("description"));
            if let Value::Object(inner_map) = &mut inner {
                inner_map.insert("nullable".to_string(), Value::Bool(true));
            }
            return inner;
        }
    }

    let mut out = Map::new();
    for (key, v) in map {
        match key.as_str() {
            "type" => match v {
                Value::String(t) => {
                    out.insert("type".to_string(), Value::String(t.to_uppercase()));
                }
                Value::Array(types) => {
                    for t in types.iter().filter_map(|t| t.as_str()) {
                        if t == "null" {
                            out.insert("nullable".to_string(), Value::Bool(true));
                        } else {
                            out.insert("type".to_string(), Value::String(t.to_uppercase()));
                        }
                    }
                }
                _ => {}
            },
            "properties" => {
                if let Value::Object(props) = v {
                    let converted: Map<String, Value> = props
                        .iter()
                        .map(|(name, prop)| (name.clone(), convert(prop, definitions)))
                        .collect();
                    out.insert("properties".to_string(), Value::Object(converted));
                }
            }
            "items" => {
                out.insert("items".to_string(), convert(v, definitions));
            }
            "format" => {
                if v.as_str().is_some_and(|f| SUPPORTED_FORMATS.contains(&f)) {
                    out.insert("format".to_string(), v.clone());
                }
            }
            "required" | "description" | "enum" | "nullable" => {
                out.insert(key.clone(), v.clone());
            }
            // $schema, title, definitions, default, minimum, additionalProperties...
            _ => {}
        }
    }

    Value::Object(out)
}

fn with_description(mut value: Value, description: Option<&Value>) -> Value {
    if let (Value::Object(map), Some(desc)) = (&mut value, description) {
        map.entry("description".to_string())
            .or_insert_with(|| desc.clone());
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Hours {
        summary: String,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Venue {
        name: String,
        address: Option<String>,
        tags: Vec<String>,
        rating: Option<f64>,
        score: i32,
        hours: Hours,
        late_hours: Option<Hours>,
    }

    #[test]
    fn test_types_are_uppercase() {
        let schema = Venue::gemini_schema();

        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["name"]["type"], "STRING");
        assert_eq!(schema["properties"]["tags"]["type"], "ARRAY");
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "STRING");
        assert_eq!(schema["properties"]["score"]["type"], "INTEGER");
        assert_eq!(schema["properties"]["score"]["format"], "int32");
    }

    #[test]
    fn test_option_becomes_nullable() {
        let schema = Venue::gemini_schema();
        let address = &schema["properties"]["address"];

        assert_eq!(address["type"], "STRING");
        assert_eq!(address["nullable"], true);
        assert_eq!(schema["properties"]["rating"]["type"], "NUMBER");
        assert_eq!(schema["properties"]["rating"]["nullable"], true);
    }

    #[test]
    fn test_refs_are_inlined() {
        let schema = Venue::gemini_schema();
        let text = serde_json::to_string(&schema).unwrap();

        assert!(!text.contains("$ref"));
        assert!(!text.contains("definitions"));
        assert!(!text.contains("$schema"));
        assert_eq!(schema["properties"]["hours"]["type"], "OBJECT");
        assert_eq!(
            schema["properties"]["hours"]["properties"]["summary"]["type"],
            "STRING"
        );
        assert_eq!(schema["properties"]["late_hours"]["type"], "OBJECT");
        assert_eq!(schema["properties"]["late_hours"]["nullable"], true);
    }

    #[test]
    fn test_required_only_lists_non_optional() {
        let schema = Venue::gemini_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();

        assert!(required.contains(&"name"));
        assert!(required.contains(&"tags"));
        assert!(!required.contains(&"address"));
    }
}
