//! Classified archive responses

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::Document;
use crate::errors::ArchiveError;
use super::file::StoredFile;

/// One entry of a result list
///
/// Object rows are promoted to [`Document`]s; anything else the archive
/// returns in `results` is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultRow {
    Document(Document),
    Raw(Value),
}

impl ResultRow {
    /// Promote a raw JSON row.
    ///
    /// Objects that fail document decoding stay raw.
    pub fn from_value(value: Value) -> Self {
        match Document::from_value(&value) {
            Ok(document) => Self::Document(document),
            Err(_) => Self::Raw(value),
        }
    }

    /// Why an object row could not be read as a document.
    ///
    /// `None` for document rows and for rows that are not objects.
    pub fn decode_error(&self) -> Option<ArchiveError> {
        match self {
            Self::Raw(value) if value.is_object() => Document::from_value(value).err(),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(document) => Some(document),
            Self::Raw(_) => None,
        }
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            Self::Document(document) => Some(document),
            Self::Raw(_) => None,
        }
    }
}

/// Accumulated rows of a (possibly multi-page) JSON response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// HTTP status of the first page
    pub status: u16,
    /// Total reported by the archive, when the body carried one
    pub count: Option<u64>,
    pub rows: Vec<ResultRow>,
    /// Number of pages fetched to build this set
    pub pages: u32,
    /// First-page body, kept for endpoints without a `results` list
    pub raw: Option<Value>,
}

impl ResultSet {
    pub fn empty(status: u16) -> Self {
        Self { status, ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Documents in result order, skipping raw rows.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.rows.iter().filter_map(ResultRow::as_document)
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.rows.into_iter().filter_map(ResultRow::into_document).collect()
    }
}

/// Classified outcome of one engine call
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveResponse {
    /// 200/201 with a JSON (or empty) body
    Results(ResultSet),
    /// Attachment body persisted through the file store
    File(StoredFile),
    /// 204
    NoContent,
    /// Any other success-range status; treated as a soft failure
    Unhandled(u16),
}

impl ArchiveResponse {
    /// True for statuses callers treat as success.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Unhandled(_))
    }

    /// Result rows, or an empty set for non-JSON outcomes.
    pub fn into_results(self) -> ResultSet {
        match self {
            Self::Results(set) => set,
            Self::NoContent => ResultSet::empty(204),
            Self::Unhandled(status) => ResultSet::empty(status),
            Self::File(_) => ResultSet::empty(200),
        }
    }
}
