//! Outbound request construction
//!
//! URL building for archive endpoints and encoding of document payloads
//! into multipart form fields.

pub mod rewrite;

use archivist_domain::constants::{GDPR_ENDPOINT, LOOKFOR_PARAM};
use archivist_domain::ArchiveConfig;
use serde_json::{Map, Value};

/// Builds archive URLs from the configured base URL and API version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointBuilder {
    base_url: String,
    version: String,
}

impl EndpointBuilder {
    pub fn new(base_url: impl Into<String>, version: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), version: version.into() }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(&config.base_url, &config.version)
    }

    /// `{base}/{version}/{endpoint}/` plus the encoded query.
    ///
    /// The base URL may or may not end in a slash; exactly one separates it
    /// from the version. The endpoint path always ends in a slash, so URLs
    /// without a query end in one too.
    pub fn url(&self, endpoint: &str, params: &Map<String, Value>) -> String {
        let mut url = format!("{}/{}/{}/", self.base(), self.version, endpoint.trim_matches('/'));

        let query = encode_query(params);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url
    }

    /// Endpoint URL without query parameters.
    pub fn path(&self, endpoint: &str) -> String {
        self.url(endpoint, &Map::new())
    }

    /// GDPR export/delete URL for a user. Not versioned.
    pub fn gdpr(&self, user_id: &str) -> String {
        format!("{}/{GDPR_ENDPOINT}/{user_id}", self.base())
    }

    /// Base URL with `suffix` appended verbatim.
    ///
    /// Attachment integration ids are server-relative paths that already
    /// carry their own leading slash.
    pub fn absolute(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.base_url)
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Encode search parameters as `key=value` pairs joined by `&`.
///
/// A `lookfor` map becomes a single `lookfor=k1:v1,k2:v2` parameter. Keys
/// and values are percent-encoded; the `:` and `,` separators of `lookfor`
/// are not.
pub fn encode_query(params: &Map<String, Value>) -> String {
    params
        .iter()
        .map(|(key, value)| match (key.as_str(), value) {
            (LOOKFOR_PARAM, Value::Object(filters)) => {
                let joined = filters
                    .iter()
                    .map(|(k, v)| format!("{}:{}", encode(k), encode(&scalar(v))))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{LOOKFOR_PARAM}={joined}")
            }
            _ => format!("{}={}", encode(key), encode(&scalar(value))),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// One multipart text part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub contents: String,
}

/// Encode a payload map as multipart text parts.
///
/// Scalars become name/value parts; lists and maps are JSON-encoded into a
/// single part. Nulls are skipped.
pub fn form_fields(values: &Map<String, Value>) -> Vec<FormField> {
    values
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| FormField { name: name.clone(), contents: scalar(value) })
        .collect()
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn encode(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
