//! Outbound content sanitisation

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("HTML_TAG should compile - this is a bug"));

/// Prepare a content tree for the archive.
///
/// Walks the tree depth-first. HTML tags are stripped from every string leaf
/// and every empty list becomes an empty object, since the archive rejects
/// empty JSON lists inside `content`. Non-empty lists and scalars other than
/// strings are kept.
pub fn sanitize_content(value: &mut Value) {
    match value {
        Value::String(text) => {
            if HTML_TAG.is_match(text) {
                *text = HTML_TAG.replace_all(text, "").into_owned();
            }
        }
        Value::Array(items) if items.is_empty() => *value = Value::Object(Map::new()),
        Value::Array(items) => items.iter_mut().for_each(sanitize_content),
        Value::Object(map) => map.values_mut().for_each(sanitize_content),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
