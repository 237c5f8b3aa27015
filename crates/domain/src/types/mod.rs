//! Domain types and models

pub mod content;
pub mod document;
pub mod event;
pub mod file;
pub mod response;

pub use content::sanitize_content;
pub use document::{parse_malformed_json, Document};
pub use event::{ArchiveEvent, OperationKind};
pub use file::StoredFile;
pub use response::{ArchiveResponse, ResultRow, ResultSet};
