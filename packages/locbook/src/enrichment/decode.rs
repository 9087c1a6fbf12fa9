//! Defensive decoding of model output that was not schema-enforced.
//!
//! Markdown fences are stripped first, then each strategy is tried in order
//! and the first object it yields wins.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::EnrichmentError;

static RE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").unwrap());

static RE_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

type Strategy = fn(&str) -> Option<Value>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("permissive", parse_permissive),
    ("embedded", parse_embedded),
    ("literal", parse_literal),
];

/// Decode a model response into a JSON object.
pub fn decode(text: &str) -> Result<Value, EnrichmentError> {
    let body = strip_fences(text);

    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(body) {
            debug!(strategy = *name, "Decoded model response");
            return Ok(value);
        }
    }

    warn!(
        response_len = text.len(),
        preview = %text.chars().take(200).collect::<String>(),
        "Model response could not be decoded"
    );
    Err(EnrichmentError::ParseFailure)
}

/// Content of the first fenced block, or the trimmed input when unfenced.
pub fn strip_fences(text: &str) -> &str {
    RE_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim()
}

/// Strict JSON after escaping raw control characters inside strings.
pub fn parse_permissive(text: &str) -> Option<Value> {
    let escaped = escape_control_chars(text.trim());
    serde_json::from_str::<Value>(&escaped)
        .ok()
        .filter(Value::is_object)
}

/// The outermost `{...}` span embedded in prose.
pub fn parse_embedded(text: &str) -> Option<Value> {
    let span = RE_OBJECT.find(text)?.as_str();
    parse_permissive(span)
}

/// Literal-style object: single quotes, `True`/`False`/`None`, trailing commas.
pub fn parse_literal(text: &str) -> Option<Value> {
    let span = RE_OBJECT.find(text)?.as_str();
    parse_permissive(&literal_to_json(span))
}

fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }
    out
}

/// Rewrite a literal-style object into JSON.
fn literal_to_json(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let quote = c;
                out.push('"');
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    match chars[i] {
                        '\\' if i + 1 < chars.len() => {
                            let next = chars[i + 1];
                            if next == '\'' {
                                out.push('\'');
                            } else {
                                out.push('\\');
                                out.push(next);
                            }
                            i += 2;
                            continue;
                        }
                        '"' => out.push_str("\\\""),
                        other => out.push(other),
                    }
                    i += 1;
                }
                out.push('"');
                i += 1;
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(',');
                }
                i += 1;
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}
