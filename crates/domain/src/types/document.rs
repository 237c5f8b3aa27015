//! Archive document model
//!
//! A [`Document`] is one archive record: case metadata plus the opaque
//! content payload. Every field is optional; only keys present in the input
//! are populated and only populated fields are written back out.
//!
//! The archive occasionally returns `metadata` and `content` as JSON encoded
//! strings in a Python-flavoured dialect (`{'a': False}`), so string values
//! for those two keys are normalised with [`parse_malformed_json`] before
//! decoding.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{ArchiveError, Result};

/// One archive record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    id: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    status: Option<String>,
    document_type: Option<String>,
    service: Option<String>,
    transaction_id: Option<String>,
    user_id: Option<String>,
    business_id: Option<String>,
    tos_function_id: Option<String>,
    tos_record_id: Option<String>,
    metadata: Option<Map<String, Value>>,
    content: Option<Map<String, Value>>,
    draft: Option<bool>,
    locked_after: Option<String>,
    attachments: Option<Vec<Value>>,
    href: Option<String>,
}

impl Document {
    /// Build a document from a wire map, copying only the keys present.
    ///
    /// Null values count as absent.
    ///
    /// # Errors
    /// Returns `ArchiveError::InvalidInput` when a key holds a value of the
    /// wrong shape, or when string encoded `metadata`/`content` cannot be
    /// decoded even after normalisation.
    pub fn create(values: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            id: string_field(values, "id")?,
            created_at: string_field(values, "created_at")?,
            updated_at: string_field(values, "updated_at")?,
            status: nested_string_field(values, "status", "value")?,
            document_type: string_field(values, "type")?,
            service: nested_string_field(values, "service", "name")?,
            transaction_id: string_field(values, "transaction_id")?,
            user_id: string_field(values, "user_id")?,
            business_id: string_field(values, "business_id")?,
            tos_function_id: string_field(values, "tos_function_id")?,
            tos_record_id: string_field(values, "tos_record_id")?,
            metadata: structured_field(values, "metadata")?,
            content: structured_field(values, "content")?,
            draft: bool_field(values, "draft")?,
            locked_after: string_field(values, "locked_after")?,
            attachments: list_field(values, "attachments")?,
            href: string_field(values, "href")?,
        })
    }

    /// Build a document from any JSON value that is an object.
    ///
    /// # Errors
    /// Returns `ArchiveError::InvalidInput` for non-object values.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::create(map),
            other => Err(ArchiveError::InvalidInput(format!(
                "document must be a JSON object, got {}",
                json_type(other)
            ))),
        }
    }

    /// Wire representation of the tracked field set.
    ///
    /// `service`, `user_id`, `draft`, `locked_after`, `attachments` and
    /// `href` are never emitted: the archive derives them itself and rejects
    /// some of them on write.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value.clone()));
            }
        };

        put("id", &self.id);
        put("created_at", &self.created_at);
        put("updated_at", &self.updated_at);
        put("status", &self.status);
        put("type", &self.document_type);
        put("transaction_id", &self.transaction_id);
        put("business_id", &self.business_id);
        put("tos_function_id", &self.tos_function_id);
        put("tos_record_id", &self.tos_record_id);

        if let Some(metadata) = &self.metadata {
            map.insert("metadata".into(), Value::Object(metadata.clone()));
        }
        if let Some(content) = &self.content {
            map.insert("content".into(), Value::Object(content.clone()));
        }
        map
    }

    /// Encode [`Document::to_map`] as a JSON string.
    ///
    /// # Errors
    /// Returns `ArchiveError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_map())?)
    }

    /// A document is new until the archive has assigned it an id.
    pub fn is_new(&self) -> bool {
        self.id().is_empty()
    }

    /// Document id, empty for unsaved documents.
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn document_type(&self) -> Option<&str> {
        self.document_type.as_deref()
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn business_id(&self) -> Option<&str> {
        self.business_id.as_deref()
    }

    /// Retention "function" classification id
    pub fn tos_function_id(&self) -> Option<&str> {
        self.tos_function_id.as_deref()
    }

    /// Retention "record" classification id
    pub fn tos_record_id(&self) -> Option<&str> {
        self.tos_record_id.as_deref()
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }

    pub fn content(&self) -> Option<&Map<String, Value>> {
        self.content.as_ref()
    }

    pub fn draft(&self) -> Option<bool> {
        self.draft
    }

    /// Timestamp after which the archive rejects edits
    pub fn locked_after(&self) -> Option<&str> {
        self.locked_after.as_deref()
    }

    pub fn attachments(&self) -> &[Value] {
        self.attachments.as_deref().unwrap_or_default()
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn set_metadata(&mut self, metadata: Map<String, Value>) {
        self.metadata = Some(metadata);
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.get_or_insert_with(Map::new).insert(key.into(), value);
    }

    pub fn set_content(&mut self, content: Map<String, Value>) {
        self.content = Some(content);
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn set_transaction_id(&mut self, transaction_id: impl Into<String>) {
        self.transaction_id = Some(transaction_id.into());
    }
}

impl TryFrom<&Map<String, Value>> for Document {
    type Error = ArchiveError;

    fn try_from(values: &Map<String, Value>) -> Result<Self> {
        Self::create(values)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::create(&map).map_err(D::Error::custom)
    }
}

/// Decode a JSON string written in the archive's loose dialect.
///
/// Valid JSON is decoded as-is. Otherwise single quotes become double quotes
/// and `False` becomes `false`, once, before decoding again.
///
/// # Errors
/// Returns `ArchiveError::InvalidInput` if the normalised text is not JSON.
pub fn parse_malformed_json(raw: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Ok(value);
    }

    let normalized = raw.replace('\'', "\"").replace("False", "false");
    serde_json::from_str(&normalized)
        .map_err(|e| ArchiveError::InvalidInput(format!("malformed JSON payload: {e}")))
}

fn present<'a>(values: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    values.get(key).filter(|value| !value.is_null())
}

fn string_field(values: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match present(values, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(invalid_shape(key, "a string", other)),
    }
}

// Some endpoints return `{"status": {"value": "DRAFT"}}` instead of a plain
// string.
fn nested_string_field(
    values: &Map<String, Value>,
    key: &str,
    inner: &str,
) -> Result<Option<String>> {
    match present(values, key) {
        Some(Value::Object(object)) => string_field(object, inner),
        _ => string_field(values, key),
    }
}

fn bool_field(values: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match present(values, key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(other) => Err(invalid_shape(key, "a boolean", other)),
    }
}

fn list_field(values: &Map<String, Value>, key: &str) -> Result<Option<Vec<Value>>> {
    match present(values, key) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.clone())),
        Some(other) => Err(invalid_shape(key, "a list", other)),
    }
}

fn structured_field(values: &Map<String, Value>, key: &str) -> Result<Option<Map<String, Value>>> {
    let value = match present(values, key) {
        None => return Ok(None),
        Some(Value::String(raw)) => parse_malformed_json(raw)?,
        Some(value) => value.clone(),
    };

    match value {
        Value::Object(map) => Ok(Some(map)),
        // An empty list is how the archive spells an empty map.
        Value::Array(items) if items.is_empty() => Ok(Some(Map::new())),
        other => Err(invalid_shape(key, "an object", &other)),
    }
}

fn invalid_shape(key: &str, expected: &str, got: &Value) -> ArchiveError {
    ArchiveError::InvalidInput(format!("`{key}` must be {expected}, got {}", json_type(got)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
