//! Cache key derivation for search parameters
//!
//! Search parameters are flattened into one deterministic string and hashed.
//! The free-text `lookfor` filter is excluded: it varies too much to be a
//! useful cache dimension.

use archivist_domain::constants::{LOOKFOR_PARAM, TRANSACTION_ID_PARAM};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// SHA-256 hex key for a search parameter map.
///
/// Keys are visited in sorted order at every level, so maps that differ only
/// in key order produce the same key. Whitespace is stripped before hashing.
/// Every key and value is written with a type tag and its length, and lists
/// and maps are bracketed, so no two different maps share an encoding.
pub fn cache_key(params: &Map<String, Value>) -> String {
    let mut encoded = String::new();
    for (key, value) in sorted(params) {
        if key == LOOKFOR_PARAM {
            continue;
        }
        push_token(&mut encoded, 'k', key);
        flatten(value, &mut encoded);
    }
    hex::encode(Sha256::digest(encoded.as_bytes()))
}

/// Key under which a single document is cached after a search.
///
/// Equal to [`cache_key`] of `{"transaction_id": <id>}`, so a later search
/// by transaction id alone hits the entry.
pub fn transaction_cache_key(transaction_id: &str) -> String {
    let mut params = Map::new();
    params.insert(TRANSACTION_ID_PARAM.to_string(), Value::String(transaction_id.to_string()));
    cache_key(&params)
}

fn sorted(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn flatten(value: &Value, encoded: &mut String) {
    match value {
        Value::Object(map) => {
            encoded.push('{');
            for (key, value) in sorted(map) {
                push_token(encoded, 'k', key);
                flatten(value, encoded);
            }
            encoded.push('}');
        }
        Value::Array(items) => {
            encoded.push('[');
            items.iter().for_each(|item| flatten(item, encoded));
            encoded.push(']');
        }
        Value::String(s) => push_token(encoded, 's', s),
        Value::Null => encoded.push('z'),
        other => push_token(encoded, 'v', &other.to_string()),
    }
}

// `<tag><char count>:<text>` with whitespace removed from the text.
fn push_token(encoded: &mut String, tag: char, text: &str) {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    encoded.push(tag);
    encoded.push_str(&text.chars().count().to_string());
    encoded.push(':');
    encoded.push_str(&text);
}
