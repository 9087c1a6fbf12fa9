//! Prompt templates and prompt-side formatting.

use serde_json::{json, Value};
use std::fmt::Write as _;

use super::types::PlaceDetails;

/// Instruction for the combined text + image analysis.
pub const PLACE_ANALYSIS_PROMPT: &str = r#"Role: You are a location scout cataloguing places for a personal guidebook.
Task: Combine the place data and photos below into structured attributes and a short review.

1. STRUCTURED DATA (JSON key "details"):
   - name, address
   - categories: short type tags, e.g. ["Cafe", "Workspace"]. Infer from name and reviews if missing.
   - meal_types: infer from opening hours and menu (opens 7AM -> "Breakfast", "Brunch"; open until 10PM -> "Dinner").
   - occasions: infer from the vibe (quiet with wifi -> "Work"; romantic -> "Date"; large tables -> "Group"; chill -> "Solo").
   - vibes (3 tags), mood (2 tags), aesthetic_score (1-10), lighting
   - rating (0-5), price_level, status, opening_hours (summarised), popular_times (a general guess is fine)
   - noise_level, crowd_type, amenities (list), best_time_to_visit
   Use null or [] for anything you cannot tell. Never invent an address.

2. COMMENTARY (JSON key "commentary"):
   - 3 or 4 short bullet points: hook, space and vibe, food and drink, who should go.
   - Mention specific visual details from the photos when there are any.
   - Use \n for line breaks inside the string, never raw newlines.

Respond with a single JSON object:
{"details": {"name": "...", "address": "...", "categories": [], "meal_types": [], "occasions": [], "vibes": [], "mood": [], "aesthetic_score": 8, "lighting": "...", "rating": 4.5, "price_level": "...", "status": "...", "opening_hours": "...", "popular_times": "...", "noise_level": "...", "crowd_type": "...", "amenities": [], "best_time_to_visit": "..."}, "commentary": "..."}"#;

/// Instruction for a single photo with no accompanying data.
pub const IMAGE_ANALYSIS_PROMPT: &str = r#"Identify the place in this photo. Read any visible signage, menus or map pins.
Return a JSON object with "details" (name, address, categories, meal_types, occasions, vibes, mood, aesthetic_score, lighting) and "commentary" (one or two sentences).
Use null or [] for anything you cannot tell."#;

/// Instruction for free text with no images.
pub const TEXT_ANALYSIS_PROMPT: &str = r#"Extract the place described in the text below.
Return a JSON object with "details" (name, address, categories, meal_types, occasions, vibes, mood, rating, price_level, opening_hours) and "commentary" (one or two sentences).
Use null or [] for anything you cannot tell."#;

/// Context sent with a user screenshot, in place of resolved page data.
pub const SCREENSHOT_CONTEXT: &str = "Source: user screenshot (likely a map app, social post or storefront). \
Identify the place name and address from visible text. If it is a map screenshot, read the pinned place.";

pub fn search_query_prompt(query: &str) -> String {
    format!(
        r#"Role: You are a search parser for a place database.
Task: Extract search filters from the user query.
Query: "{}"

Respond with a JSON object:
{{"keywords": "text to match name or category, or null", "vibes": ["..."], "min_rating": 0, "city": "city or district, or null", "location_needed": false}}
Set location_needed to true only when the query is relative to where the user is ("near me", "around here", "nearby").
Example: "quiet cafe in district 1" -> {{"keywords": "cafe", "vibes": ["quiet"], "min_rating": 0, "city": "District 1", "location_needed": false}}"#,
        query
    )
}

pub fn commentary_prompt(details: &PlaceDetails) -> String {
    format!(
        r#"Role: You are a location scout introducing a place to a friend.
Write a short, catchy paragraph about this place. Focus on the vibes, mood and aesthetic score.
Start directly with the feeling, no self-introduction. If vibes are missing, make a playful guess from the name and categories.

Data:
{}"#,
        compact_notation(&commentary_fields(details))
    )
}

/// Only the fields that matter for commentary.
pub fn commentary_fields(details: &PlaceDetails) -> Value {
    json!({
        "name": details.name,
        "categories": details.categories,
        "vibes": details.vibes,
        "mood": details.mood,
        "aesthetic_score": details.aesthetic_score,
        "rating": details.rating,
    })
}

/// Indented key/value rendering of a JSON value.
///
/// Nulls and empty lists are dropped; scalar lists go on one line with their
/// length, e.g. `vibes[2]: cozy,quiet`.
pub fn compact_notation(value: &Value) -> String {
    let mut out = String::new();
    write_compact(value, 0, &mut out);
    out.trim_end().to_string()
}

fn write_compact(value: &Value, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, item) in map {
                match item {
                    Value::Null => {}
                    Value::Array(items) if items.is_empty() => {}
                    Value::Array(items) if items.iter().all(is_scalar) => {
                        let joined: Vec<String> = items.iter().map(scalar_text).collect();
                        let _ = writeln!(out, "{}{}[{}]: {}", pad, key, items.len(), joined.join(","));
                    }
                    Value::Array(items) => {
                        let _ = writeln!(out, "{}{}[{}]:", pad, key, items.len());
                        for entry in items {
                            let _ = writeln!(out, "{}  -", pad);
                            write_compact(entry, indent + 2, out);
                        }
                    }
                    Value::Object(_) => {
                        let _ = writeln!(out, "{}{}:", pad, key);
                        write_compact(item, indent + 1, out);
                    }
                    scalar => {
                        let _ = writeln!(out, "{}{}: {}", pad, key, scalar_text(scalar));
                    }
                }
            }
        }
        Value::Null => {}
        other => {
            let _ = writeln!(out, "{}{}", pad, scalar_text(other));
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_notation() {
        let value = json!({
            "name": "Test Cafe",
            "vibes": ["cozy", "quiet"],
            "mood": [],
            "rating": 4.5,
            "lighting": null,
            "hours": {"weekday": "7-22"}
        });

        let text = compact_notation(&value);

        assert!(text.contains("name: Test Cafe"));
        assert!(text.contains("vibes[2]: cozy,quiet"));
        assert!(text.contains("rating: 4.5"));
        assert!(text.contains("hours:\n  weekday: 7-22"));
        assert!(!text.contains("mood"));
        assert!(!text.contains("lighting"));
    }

    #[test]
    fn test_commentary_prompt_sends_only_relevant_fields() {
        let details = PlaceDetails {
            name: Some("Test Cafe".into()),
            address: Some("12 Nguyen Hue".into()),
            vibes: vec!["cozy".into()],
            aesthetic_score: Some(8.0),
            ..Default::default()
        };

        let prompt = commentary_prompt(&details);

        assert!(prompt.contains("name: Test Cafe"));
        assert!(prompt.contains("vibes[1]: cozy"));
        assert!(prompt.contains("aesthetic_score: 8.0"));
        assert!(!prompt.contains("Nguyen Hue"));
    }

    #[test]
    fn test_search_prompt_embeds_query() {
        assert!(search_query_prompt("cafe near me").contains("Query: \"cafe near me\""));
    }
}
